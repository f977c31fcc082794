//! High-level orchestrator — the boundary the surrounding application
//! calls into.
//!
//! Construction takes the engine configuration plus the injected
//! `SecretStore`, `SessionStore`, and `Clock`. Nothing here blocks;
//! the only mutable state lives behind the injected stores.

use std::sync::Arc;

use crate::twofactor::core;
use crate::twofactor::gate::SessionGate;
use crate::twofactor::secret;
use crate::twofactor::stores::{Clock, SecretStore, SessionStore};
use crate::twofactor::types::{
    OtpError, RejectReason, Secret, TotpConfig, VerificationResult,
};
use crate::twofactor::uri;

/// Result of a successful enrollment: the secret the caller may show
/// once, and the provisioning URI for the authenticator app to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub secret: Secret,
    pub provisioning_uri: String,
}

/// Central second-factor service.
pub struct TwoFactorService {
    config: TotpConfig,
    secrets: Arc<dyn SecretStore>,
    gate: SessionGate,
    clock: Arc<dyn Clock>,
}

impl TwoFactorService {
    pub fn new(
        config: TotpConfig,
        secrets: Arc<dyn SecretStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            secrets,
            gate: SessionGate::new(sessions),
            clock,
        }
    }

    pub fn config(&self) -> &TotpConfig {
        &self.config
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Enrollment
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Enroll an account: generate a fresh secret, build its
    /// provisioning URI, and persist the secret.
    ///
    /// The label is validated before anything is stored, so a bad
    /// identity never leaves a secret behind with an unusable URI.
    /// Re-enrolling replaces any previous secret wholesale.
    pub fn enroll(&self, account_id: &str, label: &str) -> Result<Enrollment, OtpError> {
        let new_secret = secret::generate()?;
        let provisioning_uri =
            uri::build_provisioning_uri(&new_secret, label, &self.config.issuer, &self.config)?;

        self.secrets.set(account_id, new_secret.clone());
        log::debug!("enrolled second factor for account {}", account_id);

        Ok(Enrollment {
            secret: new_secret,
            provisioning_uri,
        })
    }

    /// Destroy an account's enrolled secret (2FA disable / reset).
    /// Returns `true` if a secret was removed.
    pub fn disenroll(&self, account_id: &str) -> bool {
        let removed = self.secrets.remove(account_id).is_some();
        if removed {
            log::debug!("removed second factor for account {}", account_id);
        }
        removed
    }

    /// Whether the account has an enrolled secret. When `false`, the
    /// session gate is bypassed entirely — no second factor required.
    pub fn requires_second_factor(&self, account_id: &str) -> bool {
        self.secrets.get(account_id).is_some()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Challenge
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Check a submitted code against the account's stored secret.
    ///
    /// Mismatches, malformed codes, and unenrolled accounts are ordinary
    /// negative results so the caller can rate-limit attempts as normal
    /// flow control. Only a corrupt *stored* secret is an `Err` — that
    /// is a data problem, not a user-facing verification failure.
    pub fn challenge(
        &self,
        account_id: &str,
        submitted_code: &str,
    ) -> Result<VerificationResult, OtpError> {
        let stored = match self.secrets.get(account_id) {
            Some(s) => s,
            None => return Ok(VerificationResult::rejected(RejectReason::NotEnrolled)),
        };

        match core::verify_code_at(&stored, submitted_code, &self.config, self.clock.now_unix()) {
            Ok(outcome) if outcome.valid => Ok(VerificationResult::accepted(outcome.drift)),
            Ok(_) => Ok(VerificationResult::rejected(RejectReason::CodeMismatch)),
            Err(OtpError::InvalidCodeFormat(_)) => {
                Ok(VerificationResult::rejected(RejectReason::MalformedCode))
            }
            Err(e) => {
                log::warn!("stored secret for account {} is unusable: {}", account_id, e);
                Err(e)
            }
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Session gate
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Whether the session has satisfied its second factor.
    pub fn is_session_verified(&self, session_id: &str) -> bool {
        self.gate.is_satisfied(session_id)
    }

    /// Record that the session's second factor was satisfied.
    pub fn mark_session_verified(&self, session_id: &str) {
        self.gate.mark_satisfied(session_id);
    }

    /// Drop the session's flag (logout / expiry).
    pub fn reset_session(&self, session_id: &str) {
        self.gate.reset(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twofactor::stores::{FixedClock, MemorySecretStore, MemorySessionStore};

    const NOW: u64 = 1_111_111_109;

    fn service() -> (TwoFactorService, Arc<MemorySecretStore>, Arc<FixedClock>) {
        let secrets = Arc::new(MemorySecretStore::new());
        let clock = Arc::new(FixedClock::at(NOW));
        let svc = TwoFactorService::new(
            TotpConfig::new("Example"),
            secrets.clone(),
            Arc::new(MemorySessionStore::new()),
            clock.clone(),
        );
        (svc, secrets, clock)
    }

    /// The code an authenticator app would show at `at`.
    fn app_code(svc: &TwoFactorService, secret: &Secret, at: u64) -> String {
        core::generate_code_at(secret, svc.config(), at).unwrap()
    }

    // ── Enrollment ───────────────────────────────────────────────

    #[test]
    fn enroll_persists_and_returns_uri() {
        let (svc, secrets, _) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();

        assert_eq!(secrets.get("alice").unwrap(), enrollment.secret);
        assert!(enrollment.provisioning_uri.starts_with("otpauth://totp/Example:"));
        assert!(enrollment
            .provisioning_uri
            .contains(&format!("secret={}", enrollment.secret.as_str())));
    }

    #[test]
    fn enroll_bad_label_persists_nothing() {
        let (svc, secrets, _) = service();
        let result = svc.enroll("alice", "   ");
        assert!(matches!(result, Err(OtpError::InvalidLabel(_))));
        assert!(secrets.get("alice").is_none());
    }

    #[test]
    fn reenroll_replaces_secret_wholesale() {
        let (svc, _, _) = service();
        let first = svc.enroll("alice", "alice@example.com").unwrap();
        let second = svc.enroll("alice", "alice@example.com").unwrap();
        assert_ne!(first.secret, second.secret);

        // Codes from the first secret no longer verify.
        let stale = app_code(&svc, &first.secret, NOW);
        let fresh = app_code(&svc, &second.secret, NOW);
        if stale != fresh {
            assert!(!svc.challenge("alice", &stale).unwrap().ok);
        }
        assert!(svc.challenge("alice", &fresh).unwrap().ok);
    }

    #[test]
    fn disenroll_removes_secret() {
        let (svc, _, _) = service();
        svc.enroll("alice", "alice@example.com").unwrap();
        assert!(svc.requires_second_factor("alice"));

        assert!(svc.disenroll("alice"));
        assert!(!svc.requires_second_factor("alice"));
        assert!(!svc.disenroll("alice"));
    }

    // ── Challenge ────────────────────────────────────────────────

    #[test]
    fn challenge_accepts_current_code() {
        let (svc, _, _) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();
        let code = app_code(&svc, &enrollment.secret, NOW);

        let result = svc.challenge("alice", &code).unwrap();
        assert!(result.ok);
        assert_eq!(result.drift, Some(0));
    }

    #[test]
    fn challenge_accepts_adjacent_step() {
        let (svc, _, _) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();
        // Device clock one step behind the server.
        let code = app_code(&svc, &enrollment.secret, NOW - 30);

        let result = svc.challenge("alice", &code).unwrap();
        assert!(result.ok);
        assert_eq!(result.drift, Some(-1));
    }

    #[test]
    fn challenge_rejects_wrong_code() {
        let (svc, _, _) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();
        let code = app_code(&svc, &enrollment.secret, NOW);
        let wrong = if code == "000000" { "000001" } else { "000000" };

        let result = svc.challenge("alice", wrong).unwrap();
        assert!(!result.ok);
        assert_eq!(result.reason, Some(RejectReason::CodeMismatch));
    }

    #[test]
    fn challenge_malformed_code_is_negative_not_error() {
        let (svc, _, _) = service();
        svc.enroll("alice", "alice@example.com").unwrap();

        for bad in ["12345", "1234567", "12a456", ""] {
            let result = svc.challenge("alice", bad).unwrap();
            assert!(!result.ok);
            assert_eq!(result.reason, Some(RejectReason::MalformedCode));
        }
    }

    #[test]
    fn challenge_unenrolled_account() {
        let (svc, _, _) = service();
        let result = svc.challenge("nobody", "123456").unwrap();
        assert!(!result.ok);
        assert_eq!(result.reason, Some(RejectReason::NotEnrolled));
    }

    #[test]
    fn challenge_corrupt_stored_secret_is_error() {
        let (svc, secrets, _) = service();
        // '1' is outside the base32 alphabet — a data problem, never a
        // silent mismatch.
        secrets.set("alice", Secret::new("MR1GG33M"));
        let result = svc.challenge("alice", "123456");
        assert!(matches!(result, Err(OtpError::InvalidSecret(_))));
    }

    #[test]
    fn challenge_is_deterministic_for_fixed_time() {
        let (svc, _, _) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();
        let code = app_code(&svc, &enrollment.secret, NOW);

        let first = svc.challenge("alice", &code).unwrap();
        for _ in 0..3 {
            assert_eq!(svc.challenge("alice", &code).unwrap(), first);
        }
    }

    #[test]
    fn challenge_rejects_expired_code_after_clock_advance() {
        let (svc, _, clock) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();
        let code = app_code(&svc, &enrollment.secret, NOW);

        // Two steps later the code has left the ±1 window.
        clock.set(NOW + 90);
        let result = svc.challenge("alice", &code).unwrap();
        assert!(!result.ok);
    }

    // ── Full login flow ──────────────────────────────────────────

    #[test]
    fn login_flow_enroll_challenge_gate() {
        let (svc, _, _) = service();
        let enrollment = svc.enroll("alice", "alice@example.com").unwrap();

        // Primary login done, second factor pending.
        assert!(svc.requires_second_factor("alice"));
        assert!(!svc.is_session_verified("sess-1"));

        // Failed attempt: no transition.
        let _ = svc.challenge("alice", "000000").unwrap();
        assert!(!svc.is_session_verified("sess-1"));

        // Successful attempt: caller marks the session.
        let code = app_code(&svc, &enrollment.secret, NOW);
        assert!(svc.challenge("alice", &code).unwrap().ok);
        svc.mark_session_verified("sess-1");
        assert!(svc.is_session_verified("sess-1"));
        assert!(!svc.is_session_verified("sess-2"));

        // Logout discards the flag.
        svc.reset_session("sess-1");
        assert!(!svc.is_session_verified("sess-1"));
    }
}
