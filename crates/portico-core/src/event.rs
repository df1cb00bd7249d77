//! Gateway event and response envelope types.
//!
//! These types mirror the JSON shapes the HTTP-gateway integration uses to
//! carry a request into a function and a response back out. Wire field names
//! are `camelCase`; fields the gateway sends as `null` deserialize as empty
//! maps so downstream stages never branch on absent vs. empty.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Deserializes a JSON `null` as the type's default value.
///
/// The gateway emits `"queryStringParameters": null` for requests without a
/// query string; plain `#[serde(default)]` only covers the missing-key case.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The inbound HTTP-gateway proxy event.
///
/// Header and parameter sections are kept as JSON object maps rather than
/// string maps: section validation may coerce individual values (trimmed
/// strings, parsed numbers) and writes the coerced output back in place, so
/// values are not strings for their whole lifetime.
///
/// The gateway carries two parallel representations of headers and query
/// parameters: a "latest value wins" single-value map and an "all values"
/// array map. Both are present on the event and are validated independently.
///
/// # Example
///
/// ```
/// use portico_core::ProxyEvent;
///
/// let event: ProxyEvent = serde_json::from_str(
///     r#"{
///         "httpMethod": "GET",
///         "headers": {"Host": "api.example.com"},
///         "queryStringParameters": null,
///         "body": null
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(event.http_method, "GET");
/// assert!(event.query_string_parameters.is_empty());
/// assert!(event.body.is_null());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyEvent {
    /// The HTTP method of the request (`GET`, `POST`, ...).
    pub http_method: String,

    /// Request path as sent by the gateway.
    pub path: Option<String>,

    /// Single-value headers ("latest value wins").
    #[serde(deserialize_with = "null_default")]
    pub headers: Map<String, Value>,

    /// Multi-value headers (every value received, in order).
    #[serde(deserialize_with = "null_default")]
    pub multi_value_headers: Map<String, Value>,

    /// Single-value query string parameters.
    #[serde(deserialize_with = "null_default")]
    pub query_string_parameters: Map<String, Value>,

    /// Multi-value query string parameters.
    #[serde(deserialize_with = "null_default")]
    pub multi_value_query_string_parameters: Map<String, Value>,

    /// Path parameters extracted by the gateway route.
    #[serde(deserialize_with = "null_default")]
    pub path_parameters: Map<String, Value>,

    /// The request payload. A string (or null) on the wire; replaced with the
    /// decoded structured value by the body-decode stage.
    pub body: Value,

    /// Whether `body` is base64-encoded on the wire.
    pub is_base64_encoded: bool,

    /// The original string body, preserved verbatim before any decoding.
    #[serde(skip)]
    pub raw_body: Option<String>,

    /// Cookies parsed from the `Cookie` header.
    #[serde(skip)]
    pub cookies: HashMap<String, String>,

    /// Decoded token claims, attached by the authentication stage.
    #[serde(skip)]
    pub jwt: Option<Value>,
}

impl ProxyEvent {
    /// Creates an event for the given method with everything else empty.
    #[must_use]
    pub fn for_method(method: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            ..Self::default()
        }
    }

    /// Looks up a single-value header, case-insensitively.
    ///
    /// The gateway forwards header names with whatever casing the client
    /// used, so `Authorization` and `authorization` must both resolve.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, value)| value.as_str())
    }

    /// Inserts a single-value header, replacing any existing value for the
    /// name regardless of case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers
            .retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, Value::String(value.into()));
    }
}

/// Invocation metadata supplied by the hosting platform.
///
/// Portico passes this through to business code unchanged; it makes no
/// attempt to observe remaining-time budgets or other lifecycle signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FunctionContext {
    /// Name of the invoked function.
    pub function_name: String,
    /// Version or alias of the invoked function.
    pub function_version: String,
    /// Unique identifier for this invocation.
    pub request_id: String,
    /// Fully qualified identifier of the invoked function.
    pub invoked_function_arn: String,
}

/// A response header value: a single string or every value for the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    /// A single header value.
    One(String),
    /// Multiple values for the same header name.
    Many(Vec<String>),
}

impl HeaderValue {
    /// Appends a value, upgrading a single value to a list.
    pub fn push(&mut self, value: impl Into<String>) {
        match self {
            Self::One(existing) => {
                *self = Self::Many(vec![std::mem::take(existing), value.into()]);
            }
            Self::Many(values) => values.push(value.into()),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// The outbound gateway response envelope.
///
/// Produced fresh per invocation and never mutated after being returned.
/// Headers are ordered; a value may be a single string or a string array
/// (for example multiple `Set-Cookie` entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers, in insertion order.
    pub headers: IndexMap<String, HeaderValue>,
    /// Response body. Binary payloads are base64-encoded.
    pub body: String,
    /// Whether `body` is base64-encoded.
    pub is_base64_encoded: bool,
}

impl ResponseEnvelope {
    /// Creates an envelope with the given status and an empty body.
    #[must_use]
    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            headers: IndexMap::new(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }
}
