//! Content-sniffing body decoding.
//!
//! The original string body is preserved verbatim in `raw_body` before any
//! decoding. Under [`BodyDecodePolicy::Auto`] the precedence is fixed:
//! JSON parse first, then form-url-encoded, then leave the body as the
//! original string. A body that is both valid JSON and valid form encoding
//! decodes as JSON.

use portico_core::ProxyEvent;
use serde_json::{Map, Value};

/// How the body-decode stage treats the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyDecodePolicy {
    /// Sniff the content: JSON, then form-url-encoded, then raw string.
    #[default]
    Auto,
    /// Always apply form-url-encoded rules, overriding JSON sniffing.
    FormUrlEncoded,
    /// Leave the body completely untouched (still copied to `raw_body`).
    None,
}

/// Decodes the event body in place according to the policy.
///
/// Only string bodies are decoded; a null or already-structured body is
/// left alone. Repeated form keys collect into an array, matching the
/// multi-value representation the gateway uses elsewhere.
pub fn decode_body(event: &mut ProxyEvent, policy: BodyDecodePolicy) {
    let Some(raw) = event.body.as_str().map(str::to_string) else {
        return;
    };
    event.raw_body = Some(raw.clone());

    match policy {
        BodyDecodePolicy::None => {}
        BodyDecodePolicy::Auto => {
            if let Ok(parsed) = serde_json::from_str::<Value>(&raw) {
                event.body = parsed;
            } else if let Some(form) = parse_form(&raw) {
                event.body = form;
            }
        }
        BodyDecodePolicy::FormUrlEncoded => {
            if let Some(form) = parse_form(&raw) {
                event.body = form;
            } else {
                tracing::debug!("body does not parse as form-url-encoded; leaving as string");
            }
        }
    }
}

/// Parses a form-url-encoded payload into a JSON object.
///
/// A payload without a single `=` is not treated as form data; bare words
/// would otherwise "parse" into a key with an empty value and auto mode
/// could never fall through to the raw string.
fn parse_form(raw: &str) -> Option<Value> {
    if !raw.contains('=') {
        return None;
    }
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw).ok()?;

    let mut object = Map::new();
    for (key, value) in pairs {
        match object.get_mut(&key) {
            None => {
                object.insert(key, Value::String(value));
            }
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
        }
    }
    Some(Value::Object(object))
}
