//! Client-side JWT expiry prediction.
//!
//! The signature is never checked here; the server remains the authority. The
//! `exp` claim is only read to decide whether a refresh is worth attempting
//! before the next request.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

/// Result of decoding a token's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenExpiry {
    /// Payload decoded and carries `exp` (Unix seconds).
    ExpiresAt(i64),
    /// Payload decoded but has no usable `exp`.
    NoExpiry,
    /// Payload segment missing or not base64url JSON.
    Malformed,
}

/// Decodes the `exp` claim of a JWT without verifying it.
///
/// Numeric strings are accepted as well as JSON numbers.
pub fn token_expiry(token: &str) -> TokenExpiry {
    let Some(segment) = token.split('.').nth(1).filter(|segment| !segment.is_empty()) else {
        return TokenExpiry::Malformed;
    };

    // Tolerate padded and standard-alphabet encodings.
    let normalized = segment
        .trim_end_matches('=')
        .replace('+', "-")
        .replace('/', "_");
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(normalized.as_bytes()) else {
        return TokenExpiry::Malformed;
    };
    let Ok(payload) = serde_json::from_slice::<Value>(&bytes) else {
        return TokenExpiry::Malformed;
    };

    let seconds = match payload.get("exp") {
        Some(Value::Number(exp)) => exp.as_f64(),
        Some(Value::String(exp)) => exp.trim().parse::<f64>().ok(),
        _ => None,
    };
    expiry_from_seconds(seconds)
}

/// `exp` of zero or a non-finite value disables the expiry check. Fractional
/// seconds round up so `now >= exp` holds for whole-second `now`.
#[allow(clippy::cast_possible_truncation)]
fn expiry_from_seconds(seconds: Option<f64>) -> TokenExpiry {
    match seconds {
        Some(value) if value.is_finite() && value != 0.0 => {
            TokenExpiry::ExpiresAt(value.ceil() as i64)
        }
        _ => TokenExpiry::NoExpiry,
    }
}

/// Whether `token` should be treated as expired at `now` (Unix seconds).
///
/// Undecodable tokens count as expired; tokens without `exp` never expire.
pub fn is_token_expired(token: &str, now: i64) -> bool {
    match token_expiry(token) {
        TokenExpiry::ExpiresAt(exp) => now >= exp,
        TokenExpiry::NoExpiry => false,
        TokenExpiry::Malformed => true,
    }
}

#[cfg(test)]
pub(crate) fn encode_test_token(payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{header}.{body}.signature")
}
