//! Dotted field-path lookup over events and claims.
//!
//! The authentication validator is configured with dotted paths such as
//! `headers.Authorization` or `queryStringParameters.xsrf`. The first
//! segment selects an event section; remaining segments descend into it.
//! Claim paths (e.g. `user.nonce`) descend into the decoded claims value.

use crate::event::ProxyEvent;
use serde_json::{Map, Value};

/// Resolves a dotted path against an event and returns the scalar at that
/// location as a string.
///
/// Recognized leading segments: `headers` (case-insensitive key lookup),
/// `multiValueHeaders`, `queryStringParameters` (alias `query`),
/// `multiValueQueryStringParameters`, `pathParameters`, `body`, `cookies`.
/// Returns `None` when any segment is absent or the leaf is not a scalar.
///
/// # Example
///
/// ```
/// use portico_core::{event_value_at, ProxyEvent};
///
/// let mut event = ProxyEvent::for_method("GET");
/// event.set_header("Authorization", "Bearer tok");
///
/// assert_eq!(
///     event_value_at(&event, "headers.Authorization").as_deref(),
///     Some("Bearer tok")
/// );
/// assert!(event_value_at(&event, "headers.X-Missing").is_none());
/// ```
#[must_use]
pub fn event_value_at(event: &ProxyEvent, path: &str) -> Option<String> {
    let mut segments = path.split('.');
    let section = segments.next()?;
    let rest: Vec<&str> = segments.collect();

    match section {
        "headers" => {
            let (key, tail) = rest.split_first()?;
            let value = event
                .headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)?;
            descend(value, tail).and_then(scalar_to_string)
        }
        "multiValueHeaders" => lookup_map(&event.multi_value_headers, &rest),
        "queryStringParameters" | "query" => lookup_map(&event.query_string_parameters, &rest),
        "multiValueQueryStringParameters" => {
            lookup_map(&event.multi_value_query_string_parameters, &rest)
        }
        "pathParameters" => lookup_map(&event.path_parameters, &rest),
        "body" => descend(&event.body, &rest).and_then(scalar_to_string),
        "cookies" => {
            let (key, tail) = rest.split_first()?;
            if !tail.is_empty() {
                return None;
            }
            event.cookies.get(*key).cloned()
        }
        _ => None,
    }
}

/// Resolves a dotted path into a claims value.
///
/// An empty path returns the claims value itself.
#[must_use]
pub fn claim_at<'a>(claims: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(claims);
    }
    let segments: Vec<&str> = path.split('.').collect();
    descend(claims, &segments)
}

fn lookup_map(map: &Map<String, Value>, segments: &[&str]) -> Option<String> {
    let (key, tail) = segments.split_first()?;
    descend(map.get(*key)?, tail).and_then(scalar_to_string)
}

fn descend<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
