//! Core OTP arithmetic — RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! Implements HMAC-based one-time passwords with SHA-1, SHA-256, and
//! SHA-512, time-step calculation, and windowed verification with
//! constant-time code comparison. Every function here is a pure,
//! bounded computation; the number of HMAC evaluations per verification
//! is at most `2 * window + 1`.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::twofactor::types::{Algorithm, OtpError, Secret, TotpConfig, VerifyOutcome};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for the given raw key bytes and counter.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u8, algo: Algorithm) -> String {
    let hmac_result = compute_hmac(key, &counter.to_be_bytes(), algo);
    truncate(&hmac_result, digits)
}

/// Compute HMAC(key, message) using the specified algorithm.
fn compute_hmac(key: &[u8], data: &[u8], algo: Algorithm) -> Vec<u8> {
    match algo {
        Algorithm::Sha1 => {
            let mut mac = Hmac::<Sha1>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts any key length");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

/// Dynamic truncation per RFC 4226 §5.3: 4-byte slice at the offset in
/// the low nibble of the last byte, top bit masked, reduced mod 10^digits.
///
/// Digits outside `1..=9` are clamped — the masked value is below 2^31,
/// and 10^10 does not fit in a u32.
fn truncate(hmac_result: &[u8], digits: u8) -> String {
    let digits = digits.clamp(1, 9);
    let offset = (hmac_result[hmac_result.len() - 1] & 0x0f) as usize;
    let binary = ((hmac_result[offset] as u32 & 0x7f) << 24)
        | ((hmac_result[offset + 1] as u32) << 16)
        | ((hmac_result[offset + 2] as u32) << 8)
        | (hmac_result[offset + 3] as u32);
    let modulus = 10u32.pow(digits as u32);
    let code = binary % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Time steps (RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute the time-step counter for a unix timestamp:
/// `floor((at - epoch) / step)`, saturating below the epoch. A zero
/// step is treated as 1.
pub fn time_step_at(unix_seconds: u64, epoch: u64, step_seconds: u64) -> u64 {
    unix_seconds.saturating_sub(epoch) / step_seconds.max(1)
}

/// Seconds remaining until the code for `unix_seconds` expires.
pub fn seconds_remaining_at(unix_seconds: u64, epoch: u64, step_seconds: u64) -> u64 {
    let step = step_seconds.max(1);
    step - (unix_seconds.saturating_sub(epoch) % step)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate the TOTP code for a secret at an explicit unix timestamp.
pub fn generate_code_at(
    secret: &Secret,
    config: &TotpConfig,
    unix_seconds: u64,
) -> Result<String, OtpError> {
    let key = secret.decode()?;
    let counter = time_step_at(unix_seconds, config.epoch, config.step_seconds);
    Ok(hotp_raw(&key, counter, config.digits, config.algorithm))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Verification
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Verify a submitted code against a secret at an explicit timestamp.
///
/// Checks the current time step and `config.window` adjacent steps on
/// either side to absorb clock drift. A code that matches nowhere in
/// the window is an `Ok` outcome with `valid == false` — only malformed
/// inputs produce errors: a wrong-length or non-numeric code is
/// [`OtpError::InvalidCodeFormat`], a secret that is not base32 is
/// [`OtpError::InvalidSecret`].
pub fn verify_code_at(
    secret: &Secret,
    code: &str,
    config: &TotpConfig,
    unix_seconds: u64,
) -> Result<VerifyOutcome, OtpError> {
    let digits = config.digits.clamp(1, 9);
    if code.len() != digits as usize || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(OtpError::InvalidCodeFormat(format!(
            "expected {} digits",
            digits
        )));
    }

    let key = secret.decode()?;
    let base_counter = time_step_at(unix_seconds, config.epoch, config.step_seconds);

    let start = base_counter.saturating_sub(config.window as u64);
    let end = base_counter + config.window as u64;

    for c in start..=end {
        let candidate = hotp_raw(&key, c, config.digits, config.algorithm);
        if constant_time_eq(candidate.as_bytes(), code.as_bytes()) {
            return Ok(VerifyOutcome {
                valid: true,
                drift: c as i64 - base_counter as i64,
                matched_counter: Some(c),
            });
        }
    }

    Ok(VerifyOutcome {
        valid: false,
        drift: 0,
        matched_counter: None,
    })
}

/// Constant-time comparison (prevents timing attacks on code checks).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
