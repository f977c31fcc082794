//! Injected collaborator capabilities: secret persistence, session
//! flags, and the clock.
//!
//! The engine treats these as opaque key-value slots — the concurrency
//! discipline belongs to the implementation, so every trait takes
//! `&self` and the in-memory implementations synchronise internally.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::twofactor::types::Secret;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Capability traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Persists the per-account shared secret (account database, vault, ...).
pub trait SecretStore: Send + Sync {
    /// Load the enrolled secret for an account, if any.
    fn get(&self, account_id: &str) -> Option<Secret>;
    /// Store (or wholesale replace) the secret for an account.
    fn set(&self, account_id: &str, secret: Secret);
    /// Remove the secret, returning it if one was enrolled.
    fn remove(&self, account_id: &str) -> Option<Secret>;
}

/// Holds the per-session second-factor flag (session store, cache, ...).
pub trait SessionStore: Send + Sync {
    /// Whether the flag is set for a session. Unknown sessions are `false`.
    fn get_flag(&self, session_id: &str) -> bool;
    /// Set or clear the flag for a session.
    fn set_flag(&self, session_id: &str, satisfied: bool);
    /// Drop the session's flag entirely (logout / expiry).
    fn clear(&self, session_id: &str);
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current unix timestamp in seconds.
    fn now_unix(&self) -> u64;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Clocks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock for tests.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    pub fn at(unix_seconds: u64) -> Self {
        Self {
            now: AtomicU64::new(unix_seconds),
        }
    }

    pub fn set(&self, unix_seconds: u64) {
        self.now.store(unix_seconds, Ordering::Relaxed);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::Relaxed)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  In-memory stores
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-memory `SecretStore` (tests and single-process deployments).
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    inner: Mutex<HashMap<String, Secret>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, account_id: &str) -> Option<Secret> {
        self.inner.lock().unwrap().get(account_id).cloned()
    }

    fn set(&self, account_id: &str, secret: Secret) {
        self.inner.lock().unwrap().insert(account_id.to_string(), secret);
    }

    fn remove(&self, account_id: &str) -> Option<Secret> {
        self.inner.lock().unwrap().remove(account_id)
    }
}

/// In-memory `SessionStore`.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<String, bool>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_flag(&self, session_id: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .get(session_id)
            .copied()
            .unwrap_or(false)
    }

    fn set_flag(&self, session_id: &str, satisfied: bool) {
        self.inner
            .lock()
            .unwrap()
            .insert(session_id.to_string(), satisfied);
    }

    fn clear(&self, session_id: &str) {
        self.inner.lock().unwrap().remove(session_id);
    }
}
