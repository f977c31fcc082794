//! Core types for the second-factor engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::twofactor::secret;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// URI-safe name for `otpauth://` parameters.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Crate-level error.
///
/// A verification *mismatch* is never an error — it is an ordinary
/// negative [`VerificationResult`], so callers can count attempts and
/// rate-limit as normal flow control.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    /// The OS entropy source is unavailable; secret generation cannot proceed.
    #[error("entropy source unavailable: {0}")]
    EntropySource(String),
    /// A stored or caller-supplied secret is not valid base32. This is a
    /// configuration/data error, not a user-facing verification failure.
    #[error("invalid base32 secret: {0}")]
    InvalidSecret(String),
    /// Submitted code has the wrong digit count or non-numeric characters.
    /// Surfaced to the user as an ordinary "incorrect code" at the service
    /// boundary.
    #[error("malformed code: {0}")]
    InvalidCodeFormat(String),
    /// Account label or issuer is empty or cannot be encoded into a URI.
    /// Fails enrollment before any secret is persisted.
    #[error("invalid account label or issuer: {0}")]
    InvalidLabel(String),
    /// A string is not a well-formed `otpauth://` provisioning URI.
    #[error("invalid provisioning uri: {0}")]
    InvalidUri(String),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secret
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A shared secret, held as base32 (RFC 4648) text.
///
/// Construction normalises the text (upper-case, spaces and dashes
/// stripped) but does not validate it — external stores may hand back
/// corrupt data, and [`Secret::decode`] is where that surfaces as
/// [`OtpError::InvalidSecret`]. Immutable once issued; re-enrollment
/// replaces the value wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap base32 text, normalising case and separators.
    pub fn new(base32_text: impl Into<String>) -> Self {
        let normalised = base32_text
            .into()
            .replace(' ', "")
            .replace('-', "")
            .to_uppercase();
        Self(normalised)
    }

    /// The base32 form, as stored and displayed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode to raw key bytes.
    pub fn decode(&self) -> Result<Vec<u8>, OtpError> {
        secret::decode_base32(&self.0)
    }

    /// Check whether the text decodes as base32.
    pub fn is_valid(&self) -> bool {
        self.decode().is_ok()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Engine configuration: issuer plus the RFC 6238 parameters.
///
/// Passed explicitly to the service at construction — there is no
/// ambient global registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpConfig {
    /// Issuer name shown in authenticator apps (e.g. "MyApp").
    pub issuer: String,
    /// Number of digits in the code (default 6, meaningful range `1..=9`).
    pub digits: u8,
    /// Time step in seconds (default 30, must be at least 1).
    pub step_seconds: u64,
    /// Epoch start `T0` in unix seconds (default 0).
    pub epoch: u64,
    /// HMAC algorithm (default SHA-1 for authenticator compatibility).
    pub algorithm: Algorithm,
    /// Clock-skew window: adjacent time steps checked on either side
    /// of the current one (default 1).
    pub window: u32,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            issuer: "App".to_string(),
            digits: 6,
            step_seconds: 30,
            epoch: 0,
            algorithm: Algorithm::Sha1,
            window: 1,
        }
    }
}

impl TotpConfig {
    /// Create a config with the given issuer name and defaults otherwise.
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Default::default()
        }
    }

    /// Builder: set the digit count, clamped to `1..=9` (a truncated
    /// HOTP value is below 2^31, so more than 9 digits add nothing).
    pub fn digits(mut self, digits: u8) -> Self {
        self.digits = digits.clamp(1, 9);
        self
    }

    /// Builder: set the time step in seconds (minimum 1).
    pub fn step_seconds(mut self, step: u64) -> Self {
        self.step_seconds = step.max(1);
        self
    }

    /// Builder: set the algorithm.
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder: set the clock-skew window.
    pub fn window(mut self, window: u32) -> Self {
        self.window = window;
        self
    }

    /// Builder: set the epoch start.
    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Engine verification outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw outcome of checking a code against a secret in `core`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOutcome {
    pub valid: bool,
    /// How many time steps off the match was (0 = exact).
    pub drift: i64,
    /// The counter value that matched (if any).
    pub matched_counter: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Boundary verification result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a challenge was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No code in the configured window matched.
    CodeMismatch,
    /// Wrong digit count or non-numeric characters.
    MalformedCode,
    /// The account has no enrolled secret.
    NotEnrolled,
}

/// Result of a `challenge` at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub ok: bool,
    pub reason: Option<RejectReason>,
    /// Time-step drift of the accepted code (0 = exact), if accepted.
    pub drift: Option<i64>,
}

impl VerificationResult {
    /// An accepted challenge.
    pub fn accepted(drift: i64) -> Self {
        Self {
            ok: true,
            reason: None,
            drift: Some(drift),
        }
    }

    /// A rejected challenge.
    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
            drift: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Algorithm ────────────────────────────────────────────────

    #[test]
    fn algorithm_default_is_sha1() {
        assert_eq!(Algorithm::default(), Algorithm::Sha1);
    }

    #[test]
    fn algorithm_display() {
        assert_eq!(Algorithm::Sha1.to_string(), "SHA1");
        assert_eq!(Algorithm::Sha256.to_string(), "SHA256");
        assert_eq!(Algorithm::Sha512.to_string(), "SHA512");
    }

    #[test]
    fn algorithm_from_str_loose() {
        assert_eq!(Algorithm::from_str_loose("sha1"), Some(Algorithm::Sha1));
        assert_eq!(Algorithm::from_str_loose("SHA-256"), Some(Algorithm::Sha256));
        assert_eq!(Algorithm::from_str_loose("HMAC-SHA512"), Some(Algorithm::Sha512));
        assert_eq!(Algorithm::from_str_loose("MD5"), None);
    }

    #[test]
    fn algorithm_serde_roundtrip() {
        let algo = Algorithm::Sha256;
        let json = serde_json::to_string(&algo).unwrap();
        assert_eq!(json, "\"SHA256\"");
        let back: Algorithm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, algo);
    }

    // ── Secret ───────────────────────────────────────────────────

    #[test]
    fn secret_normalises_on_construction() {
        let s = Secret::new("jbsw y3dp-ehpk 3pxp");
        assert_eq!(s.as_str(), "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn secret_decode_valid() {
        let s = Secret::new("JBSWY3DPEHPK3PXP");
        assert!(s.is_valid());
        assert!(!s.decode().unwrap().is_empty());
    }

    #[test]
    fn secret_decode_rejects_base32_alphabet_violations() {
        // '1' is not in the RFC 4648 base32 alphabet.
        let s = Secret::new("MR1GG33M");
        assert!(!s.is_valid());
        assert!(matches!(s.decode(), Err(OtpError::InvalidSecret(_))));
    }

    #[test]
    fn secret_serde_transparent() {
        let s = Secret::new("JBSWY3DPEHPK3PXP");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"JBSWY3DPEHPK3PXP\"");
    }

    // ── TotpConfig ───────────────────────────────────────────────

    #[test]
    fn config_defaults() {
        let cfg = TotpConfig::new("Acme");
        assert_eq!(cfg.issuer, "Acme");
        assert_eq!(cfg.digits, 6);
        assert_eq!(cfg.step_seconds, 30);
        assert_eq!(cfg.epoch, 0);
        assert_eq!(cfg.algorithm, Algorithm::Sha1);
        assert_eq!(cfg.window, 1);
    }

    #[test]
    fn config_builder() {
        let cfg = TotpConfig::new("Acme")
            .digits(8)
            .step_seconds(60)
            .algorithm(Algorithm::Sha512)
            .window(2)
            .epoch(100);
        assert_eq!(cfg.digits, 8);
        assert_eq!(cfg.step_seconds, 60);
        assert_eq!(cfg.algorithm, Algorithm::Sha512);
        assert_eq!(cfg.window, 2);
        assert_eq!(cfg.epoch, 100);
    }

    #[test]
    fn config_builder_clamps_out_of_range() {
        let cfg = TotpConfig::new("Acme").digits(0).step_seconds(0);
        assert_eq!(cfg.digits, 1);
        assert_eq!(cfg.step_seconds, 1);

        let cfg = TotpConfig::new("Acme").digits(10);
        assert_eq!(cfg.digits, 9);
    }

    // ── VerificationResult ───────────────────────────────────────

    #[test]
    fn result_accepted() {
        let r = VerificationResult::accepted(-1);
        assert!(r.ok);
        assert_eq!(r.reason, None);
        assert_eq!(r.drift, Some(-1));
    }

    #[test]
    fn result_rejected() {
        let r = VerificationResult::rejected(RejectReason::NotEnrolled);
        assert!(!r.ok);
        assert_eq!(r.reason, Some(RejectReason::NotEnrolled));
        assert_eq!(r.drift, None);
    }

    #[test]
    fn reject_reason_serde() {
        let json = serde_json::to_string(&RejectReason::CodeMismatch).unwrap();
        assert_eq!(json, "\"code_mismatch\"");
    }

    // ── Error ────────────────────────────────────────────────────

    #[test]
    fn error_display() {
        let err = OtpError::InvalidSecret("bad base32".into());
        assert!(err.to_string().contains("bad base32"));
    }
}
