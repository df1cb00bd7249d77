//! Event normalization.
//!
//! The typed [`ProxyEvent`] already guarantees the header and parameter
//! sections exist as empty maps when the gateway sent `null` or omitted
//! them, so downstream stages never branch on absent vs. empty. What is
//! left for the normalization stage is payload encoding: a base64 body is
//! decoded to text before the body decoder runs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use portico_core::ProxyEvent;

/// Normalizes the inbound event in place.
///
/// When `is_base64_encoded` is set and the body is a string, the body is
/// replaced with its decoded text and the flag is cleared. A payload that
/// is not valid base64 or not valid UTF-8 is left untouched and logged;
/// the body decoder will then treat it as an opaque string.
pub fn normalize(event: &mut ProxyEvent) {
    if !event.is_base64_encoded {
        return;
    }
    let Some(encoded) = event.body.as_str() else {
        return;
    };

    match BASE64.decode(encoded) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => {
                event.body = serde_json::Value::String(text);
                event.is_base64_encoded = false;
            }
            Err(_) => {
                tracing::warn!("base64 body does not decode to UTF-8 text; leaving as-is");
            }
        },
        Err(error) => {
            tracing::warn!(error = %error, "body flagged base64 but does not decode; leaving as-is");
        }
    }
}
