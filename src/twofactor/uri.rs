//! `otpauth://` provisioning URI building and parsing per the Google
//! Authenticator key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/ISSUER:LABEL?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`
//!
//! The full parameter set is always emitted, defaults included —
//! authenticator apps disagree on fallback values, so the URI must be
//! self-describing. This is payload formatting only; rendering the QR
//! image is the caller's concern.

use crate::twofactor::types::{Algorithm, OtpError, Secret, TotpConfig};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Build
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build the provisioning URI for a secret and account identity.
///
/// `label` is the account identifier shown in the authenticator app
/// (typically an email); `issuer` is the application name. Both are
/// display-only and are percent-encoded; empty identity fields are
/// rejected with [`OtpError::InvalidLabel`].
pub fn build_provisioning_uri(
    secret: &Secret,
    label: &str,
    issuer: &str,
    config: &TotpConfig,
) -> Result<String, OtpError> {
    if label.trim().is_empty() {
        return Err(OtpError::InvalidLabel("account label is empty".to_string()));
    }
    if issuer.trim().is_empty() {
        return Err(OtpError::InvalidLabel("issuer is empty".to_string()));
    }

    Ok(format!(
        "otpauth://totp/{issuer_enc}:{label_enc}?secret={secret}&issuer={issuer_enc}&algorithm={algo}&digits={digits}&period={period}",
        issuer_enc = url_encode(issuer),
        label_enc = url_encode(label),
        secret = secret.as_str(),
        algo = config.algorithm.uri_name(),
        digits = config.digits,
        period = config.step_seconds,
    ))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fields recovered from a provisioning URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningParts {
    pub label: String,
    pub issuer: Option<String>,
    pub secret: Secret,
    pub algorithm: Algorithm,
    pub digits: u8,
    pub period: u64,
}

/// Parse an `otpauth://totp/...` URI back into its parts.
pub fn parse_provisioning_uri(uri: &str) -> Result<ProvisioningParts, OtpError> {
    let url = url::Url::parse(uri)
        .map_err(|e| OtpError::InvalidUri(format!("not a URI: {}", e)))?;

    if url.scheme() != "otpauth" {
        return Err(OtpError::InvalidUri(format!(
            "expected scheme 'otpauth', got '{}'",
            url.scheme()
        )));
    }
    if url.host_str() != Some("totp") {
        return Err(OtpError::InvalidUri(format!(
            "unsupported OTP type: {:?}",
            url.host_str()
        )));
    }

    // Path is "/LABEL" or "/ISSUER:LABEL".
    let path = url.path();
    let path_decoded = url_decode(path.strip_prefix('/').unwrap_or(path));
    let (path_issuer, label) = match path_decoded.find(':') {
        Some(pos) => (
            Some(path_decoded[..pos].trim().to_string()),
            path_decoded[pos + 1..].trim().to_string(),
        ),
        None => (None, path_decoded),
    };

    let mut secret = None;
    let mut param_issuer = None;
    let mut algorithm = Algorithm::Sha1;
    let mut digits = 6u8;
    let mut period = 30u64;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(Secret::new(value.to_string())),
            "issuer" => param_issuer = Some(value.to_string()),
            "algorithm" => {
                if let Some(algo) = Algorithm::from_str_loose(&value) {
                    algorithm = algo;
                }
            }
            "digits" => {
                if let Ok(d) = value.parse::<u8>() {
                    digits = d;
                }
            }
            "period" => {
                if let Ok(p) = value.parse::<u64>() {
                    if p > 0 {
                        period = p;
                    }
                }
            }
            _ => {} // ignore unknown params
        }
    }

    let secret =
        secret.ok_or_else(|| OtpError::InvalidUri("missing 'secret' parameter".to_string()))?;

    Ok(ProvisioningParts {
        label,
        issuer: param_issuer.or(path_issuer),
        secret,
        algorithm,
        digits,
        period,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  URL encoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn url_encode(s: &str) -> String {
    let mut output = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                output.push(byte as char);
            }
            b' ' => output.push_str("%20"),
            b'@' => output.push_str("%40"),
            _ => output.push_str(&format!("%{:02X}", byte)),
        }
    }
    output
}

/// Decode percent-escapes into raw bytes first, then reassemble as
/// UTF-8 — multi-byte characters arrive as one escape per byte.
fn url_decode(s: &str) -> String {
    let raw = s.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' && i + 2 < raw.len() {
            if let (Some(hi), Some(lo)) = (hex_nibble(raw[i + 1]), hex_nibble(raw[i + 2])) {
                bytes.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        bytes.push(if raw[i] == b'+' { b' ' } else { raw[i] });
        i += 1;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn hex_nibble(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
