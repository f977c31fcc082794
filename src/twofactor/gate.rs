//! Per-session second-factor gate.
//!
//! A two-state machine per authentication session: `Unverified` →
//! `Verified`. The flag itself lives in the injected [`SessionStore`];
//! the gate only decides. A fresh session is always unverified, a
//! failed verification causes no transition, and the flag dies with the
//! session (logout / expiry). Retry counting and lockout are the
//! caller's policy, not the gate's.

use std::sync::Arc;

use crate::twofactor::stores::SessionStore;

/// Decision surface consumed by route-protection glue.
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn SessionStore>,
}

impl SessionGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Whether the session has satisfied its second factor.
    pub fn is_satisfied(&self, session_id: &str) -> bool {
        self.store.get_flag(session_id)
    }

    /// Record a successful second-factor verification for the session.
    pub fn mark_satisfied(&self, session_id: &str) {
        self.store.set_flag(session_id, true);
    }

    /// Discard the session's flag (logout / session expiry).
    pub fn reset(&self, session_id: &str) {
        self.store.clear(session_id);
    }
}
