//! Shared-secret generation and base32 (RFC 4648) helpers.
//!
//! Secrets come from the OS CSPRNG and are handed out base32-encoded,
//! unpadded, upper-case — the form authenticator apps expect.

use rand::RngCore;

use crate::twofactor::types::{OtpError, Secret};

/// Default raw secret length: 20 bytes = 160 bits of entropy.
pub const DEFAULT_SECRET_BYTES: usize = 20;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Generate a fresh random secret of [`DEFAULT_SECRET_BYTES`].
pub fn generate() -> Result<Secret, OtpError> {
    generate_with_length(DEFAULT_SECRET_BYTES)
}

/// Generate a random secret of `byte_length` raw bytes.
pub fn generate_with_length(byte_length: usize) -> Result<Secret, OtpError> {
    let mut buf = vec![0u8; byte_length];
    rand::rngs::OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| OtpError::EntropySource(e.to_string()))?;
    Ok(Secret::new(encode_base32(&buf)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Base32 encode / decode
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Encode raw bytes to base32 (no padding, upper-case).
pub fn encode_base32(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Decode a base32 secret (with or without spaces/dashes, case-insensitive).
pub fn decode_base32(b32: &str) -> Result<Vec<u8>, OtpError> {
    let cleaned = b32.replace(' ', "").replace('-', "").to_uppercase();
    if cleaned.is_empty() {
        return Err(OtpError::InvalidSecret("empty secret".to_string()));
    }
    // Pad to a multiple of 8 so strict decoders accept it too.
    let padded = pad_base32(&cleaned);
    base32::decode(base32::Alphabet::Rfc4648 { padding: true }, &padded)
        .or_else(|| base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned))
        .ok_or_else(|| OtpError::InvalidSecret(format!("not valid base32: {}", cleaned)))
}

/// Pad a base32 string to a multiple of 8 with '='.
fn pad_base32(s: &str) -> String {
    let remainder = s.len() % 8;
    if remainder == 0 {
        s.to_string()
    } else {
        let pad_count = 8 - remainder;
        format!("{}{}", s, "=".repeat(pad_count))
    }
}
