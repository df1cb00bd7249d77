//! Response and error formatting.
//!
//! Every invocation produces exactly one [`ResponseEnvelope`], on both the
//! success and the failure path. Headers merge lowest-precedence first:
//! handler-wide defaults, then method headers, then headers carried on the
//! reply itself.

use crate::reply::{Reply, ReplyBody};
use base64::prelude::{Engine as _, BASE64_STANDARD};
use indexmap::IndexMap;
use portico_core::{HeaderValue, PorticoError, ResponseEnvelope};
use serde_json::json;

/// Cross-origin response headers, merged into the handler-wide defaults.
///
/// # Example
///
/// ```
/// use portico::CorsOptions;
///
/// let cors = CorsOptions::new()
///     .allow_origin("https://app.example.com")
///     .allow_credentials(true)
///     .max_age_secs(600);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CorsOptions {
    allow_origin: Option<String>,
    allow_methods: Option<String>,
    allow_headers: Option<String>,
    expose_headers: Option<String>,
    allow_credentials: bool,
    max_age: Option<u64>,
}

impl CorsOptions {
    /// Creates an empty set of CORS options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `Access-Control-Allow-Origin`.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = Some(origin.into());
        self
    }

    /// Sets `Access-Control-Allow-Methods`.
    #[must_use]
    pub fn allow_methods(mut self, methods: impl Into<String>) -> Self {
        self.allow_methods = Some(methods.into());
        self
    }

    /// Sets `Access-Control-Allow-Headers`.
    #[must_use]
    pub fn allow_headers(mut self, headers: impl Into<String>) -> Self {
        self.allow_headers = Some(headers.into());
        self
    }

    /// Sets `Access-Control-Expose-Headers`.
    #[must_use]
    pub fn expose_headers(mut self, headers: impl Into<String>) -> Self {
        self.expose_headers = Some(headers.into());
        self
    }

    /// Sets `Access-Control-Allow-Credentials: true` when enabled.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Sets `Access-Control-Max-Age` in seconds.
    #[must_use]
    pub fn max_age_secs(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub(crate) fn into_headers(self) -> IndexMap<String, HeaderValue> {
        let mut headers = IndexMap::new();
        if let Some(origin) = self.allow_origin {
            headers.insert("Access-Control-Allow-Origin".to_string(), origin.into());
        }
        if let Some(methods) = self.allow_methods {
            headers.insert("Access-Control-Allow-Methods".to_string(), methods.into());
        }
        if let Some(allowed) = self.allow_headers {
            headers.insert("Access-Control-Allow-Headers".to_string(), allowed.into());
        }
        if let Some(exposed) = self.expose_headers {
            headers.insert("Access-Control-Expose-Headers".to_string(), exposed.into());
        }
        if self.allow_credentials {
            headers.insert(
                "Access-Control-Allow-Credentials".to_string(),
                "true".into(),
            );
        }
        if let Some(seconds) = self.max_age {
            headers.insert(
                "Access-Control-Max-Age".to_string(),
                seconds.to_string().into(),
            );
        }
        headers
    }
}

/// The default status for a successful reply that did not set one.
pub(crate) fn default_status(method: &str) -> u16 {
    match method {
        "DELETE" => 204,
        "POST" => 201,
        _ => 200,
    }
}

/// Merges header layers lowest-precedence first; later layers win on
/// conflicting names.
pub(crate) fn merge_headers<'a>(
    layers: impl IntoIterator<Item = &'a IndexMap<String, HeaderValue>>,
) -> IndexMap<String, HeaderValue> {
    let mut merged = IndexMap::new();
    for layer in layers {
        for (name, value) in layer {
            merged.insert(name.clone(), value.clone());
        }
    }
    merged
}

/// Assembles the success envelope from a reply.
pub(crate) fn assemble_success(
    reply: Reply,
    method: &str,
    default_headers: &IndexMap<String, HeaderValue>,
    method_headers: Option<&IndexMap<String, HeaderValue>>,
) -> ResponseEnvelope {
    let empty = IndexMap::new();
    let mut headers = merge_headers([
        default_headers,
        method_headers.unwrap_or(&empty),
        &reply.headers,
    ]);

    let status_code = reply.status.unwrap_or_else(|| default_status(method));
    let (body, is_base64_encoded) = match reply.body {
        ReplyBody::Empty => (String::new(), false),
        ReplyBody::Text(text) => (text, false),
        ReplyBody::Json(value) => match serde_json::to_string(&value) {
            Ok(serialized) => (serialized, false),
            Err(error) => {
                tracing::error!(error = %error, "reply body failed to serialize");
                (String::new(), false)
            }
        },
        ReplyBody::Binary(bytes) => (BASE64_STANDARD.encode(bytes), true),
    };

    append_cookies(&mut headers, &reply.cookies);

    ResponseEnvelope {
        status_code,
        headers,
        body,
        is_base64_encoded,
    }
}

/// Assembles the error envelope. The body is the error's explicit body if
/// one was attached, otherwise `{"type", "message"}`.
pub(crate) fn assemble_error(
    error: &PorticoError,
    default_headers: &IndexMap<String, HeaderValue>,
    method_headers: Option<&IndexMap<String, HeaderValue>>,
) -> ResponseEnvelope {
    let empty = IndexMap::new();
    let headers = merge_headers([default_headers, method_headers.unwrap_or(&empty)]);

    let body_value = error.body().cloned().unwrap_or_else(|| {
        json!({
            "type": error.wire_type(),
            "message": error.to_string(),
        })
    });
    let body = match serde_json::to_string(&body_value) {
        Ok(serialized) => serialized,
        Err(serialize_error) => {
            tracing::error!(error = %serialize_error, "error body failed to serialize");
            String::new()
        }
    };

    ResponseEnvelope {
        status_code: error.status().as_u16(),
        headers,
        body,
        is_base64_encoded: false,
    }
}

fn append_cookies(
    headers: &mut IndexMap<String, HeaderValue>,
    cookies: &[portico_extract::SetCookie],
) {
    for cookie in cookies {
        let serialized = cookie.to_header_value();
        match headers.get_mut("Set-Cookie") {
            Some(existing) => existing.push(serialized),
            None => {
                headers.insert("Set-Cookie".to_string(), serialized.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_extract::SetCookie;
    use serde_json::{json, Value};

    fn headers_of(pairs: &[(&str, &str)]) -> IndexMap<String, HeaderValue> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), HeaderValue::from(*value)))
            .collect()
    }

    #[test]
    fn method_defaults_for_unset_status() {
        assert_eq!(default_status("DELETE"), 204);
        assert_eq!(default_status("POST"), 201);
        assert_eq!(default_status("GET"), 200);
        assert_eq!(default_status("PUT"), 200);
    }

    #[test]
    fn explicit_status_wins_over_method_default() {
        let envelope = assemble_success(
            Reply::empty().status(202),
            "POST",
            &IndexMap::new(),
            None,
        );
        assert_eq!(envelope.status_code, 202);
    }

    #[test]
    fn header_layers_merge_with_later_layers_winning() {
        let defaults = headers_of(&[("X-Layer", "default"), ("X-Default-Only", "yes")]);
        let method = headers_of(&[("X-Layer", "method"), ("X-Method-Only", "yes")]);
        let envelope = assemble_success(
            Reply::text("ok").header("X-Layer", "reply"),
            "GET",
            &defaults,
            Some(&method),
        );

        assert_eq!(envelope.headers["X-Layer"], HeaderValue::from("reply"));
        assert_eq!(envelope.headers["X-Default-Only"], HeaderValue::from("yes"));
        assert_eq!(envelope.headers["X-Method-Only"], HeaderValue::from("yes"));
    }

    #[test]
    fn json_body_is_serialized() {
        let envelope = assemble_success(
            Reply::json(json!({"ok": true})),
            "GET",
            &IndexMap::new(),
            None,
        );
        assert_eq!(envelope.body, r#"{"ok":true}"#);
        assert!(!envelope.is_base64_encoded);
    }

    #[test]
    fn binary_body_is_base64_encoded() {
        let envelope = assemble_success(
            Reply::binary(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            "GET",
            &IndexMap::new(),
            None,
        );
        assert!(envelope.is_base64_encoded);
        assert_eq!(envelope.body, BASE64_STANDARD.encode([0xDE, 0xAD, 0xBE, 0xEF]));
    }

    #[test]
    fn cookies_accumulate_into_set_cookie_entries() {
        let reply = Reply::empty()
            .cookie(SetCookie::new("a", "1"))
            .cookie(SetCookie::new("b", "2"));
        let envelope = assemble_success(reply, "GET", &IndexMap::new(), None);

        let HeaderValue::Many(values) = &envelope.headers["Set-Cookie"] else {
            panic!("expected multiple Set-Cookie entries");
        };
        assert!(values[0].starts_with("a=1"));
        assert!(values[1].starts_with("b=2"));
    }

    #[test]
    fn error_envelope_carries_type_and_message() {
        let error = PorticoError::validation("body: \"age\" is required");
        let envelope = assemble_error(&error, &IndexMap::new(), None);

        assert_eq!(envelope.status_code, 400);
        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(body["type"], "ValidationError");
        assert_eq!(
            body["message"],
            "validation error: body: \"age\" is required"
        );
    }

    #[test]
    fn explicit_error_body_bypasses_default_shape() {
        let error = PorticoError::business("boom").with_body(json!({"detail": "boom"}));
        let envelope = assemble_error(&error, &IndexMap::new(), None);

        let body: Value = serde_json::from_str(&envelope.body).unwrap();
        assert_eq!(body, json!({"detail": "boom"}));
        assert_eq!(envelope.status_code, 500);
    }

    #[test]
    fn error_envelope_keeps_configured_headers() {
        let defaults = headers_of(&[("Access-Control-Allow-Origin", "*")]);
        let error = PorticoError::routing("OPTIONS");
        let envelope = assemble_error(&error, &defaults, None);
        assert_eq!(
            envelope.headers["Access-Control-Allow-Origin"],
            HeaderValue::from("*")
        );
    }

    #[test]
    fn cors_options_expand_into_headers() {
        let headers = CorsOptions::new()
            .allow_origin("https://app.example.com")
            .allow_methods("GET,POST")
            .allow_credentials(true)
            .max_age_secs(600)
            .into_headers();

        assert_eq!(
            headers["Access-Control-Allow-Origin"],
            HeaderValue::from("https://app.example.com")
        );
        assert_eq!(
            headers["Access-Control-Allow-Methods"],
            HeaderValue::from("GET,POST")
        );
        assert_eq!(
            headers["Access-Control-Allow-Credentials"],
            HeaderValue::from("true")
        );
        assert_eq!(headers["Access-Control-Max-Age"], HeaderValue::from("600"));
    }
}
