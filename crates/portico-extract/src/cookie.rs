//! Cookie parsing and response helpers.
//!
//! The request side parses the `Cookie` header into a name→value map; a
//! malformed header yields an empty map and a warning rather than an error,
//! so a bad cookie can never fail an otherwise valid request. The response
//! side provides the [`SetCookie`] builder the formatter serializes into
//! `Set-Cookie` header entries.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Parses a `Cookie` header value into a name→value map.
///
/// Values keep their content verbatim apart from trimming and removal of
/// surrounding quotes. Any segment without a `=` makes the whole header
/// malformed: the result is an empty map, logged at warn level.
///
/// # Example
///
/// ```
/// use portico_extract::parse_cookie_header;
///
/// let cookies = parse_cookie_header("session=abc123; theme=dark");
/// assert_eq!(cookies.get("session").map(String::as_str), Some("abc123"));
/// assert_eq!(cookies.get("theme").map(String::as_str), Some("dark"));
///
/// assert!(parse_cookie_header("garbage-without-equals").is_empty());
/// ```
#[must_use]
pub fn parse_cookie_header(header_value: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for segment in header_value.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((name, value)) = segment.split_once('=') else {
            tracing::warn!("malformed Cookie header; ignoring all cookies");
            return HashMap::new();
        };
        let name = name.trim();
        let value = value.trim().trim_matches('"');
        if name.is_empty() {
            tracing::warn!("cookie with empty name; ignoring all cookies");
            return HashMap::new();
        }
        cookies.insert(name.to_string(), value.to_string());
    }

    cookies
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Cookie is sent with cross-site requests.
    None,
    /// Cookie is sent with same-site and cross-site top-level navigations.
    #[default]
    Lax,
    /// Cookie is only sent with same-site requests.
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Lax => write!(f, "Lax"),
            Self::Strict => write!(f, "Strict"),
        }
    }
}

/// Builder for one `Set-Cookie` response header entry.
///
/// # Example
///
/// ```
/// use portico_extract::{SameSite, SetCookie};
///
/// let cookie = SetCookie::new("session", "abc123")
///     .http_only(true)
///     .secure(true)
///     .same_site(SameSite::Strict)
///     .max_age_secs(3600)
///     .path("/");
///
/// let header = cookie.to_header_value();
/// assert!(header.starts_with("session=abc123"));
/// assert!(header.contains("HttpOnly"));
/// assert!(header.contains("SameSite=Strict"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    domain: Option<String>,
    path: Option<String>,
    max_age: Option<Duration>,
    expires: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Creates a new Set-Cookie builder.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: None,
            expires: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    /// Creates a cookie that removes an existing cookie (`Max-Age=0`).
    #[must_use]
    pub fn remove(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age_secs(0)
    }

    /// Sets the `Domain` attribute.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the `Path` attribute.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `Max-Age` attribute.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.max_age = Some(duration);
        self
    }

    /// Sets the `Max-Age` attribute in seconds.
    #[must_use]
    pub fn max_age_secs(self, seconds: u64) -> Self {
        self.max_age(Duration::from_secs(seconds))
    }

    /// Sets the `Expires` attribute (an HTTP-date string).
    #[must_use]
    pub fn expires(mut self, date: impl Into<String>) -> Self {
        self.expires = Some(date.into());
        self
    }

    /// Sets the `Secure` attribute.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the `HttpOnly` attribute.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets the `SameSite` attribute.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Serializes this cookie into a `Set-Cookie` header value.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut header = format!("{}={}", self.name, self.value);

        if let Some(domain) = &self.domain {
            header.push_str("; Domain=");
            header.push_str(domain);
        }
        if let Some(path) = &self.path {
            header.push_str("; Path=");
            header.push_str(path);
        }
        if let Some(max_age) = self.max_age {
            header.push_str("; Max-Age=");
            header.push_str(&max_age.as_secs().to_string());
        }
        if let Some(expires) = &self.expires {
            header.push_str("; Expires=");
            header.push_str(expires);
        }
        if self.secure {
            header.push_str("; Secure");
        }
        if self.http_only {
            header.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.same_site {
            header.push_str("; SameSite=");
            header.push_str(&same_site.to_string());
        }

        header
    }
}

impl From<&str> for SetCookie {
    /// Interprets a bare string as `name=value` with no attributes; a string
    /// without `=` becomes a nameless literal passed through unchanged.
    fn from(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((name, value)) => Self::new(name, value),
            None => Self::new(raw, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_cookies() {
        let cookies = parse_cookie_header("first=1; second=2;third=3");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies["second"], "2");
    }

    #[test]
    fn quoted_values_are_unquoted() {
        let cookies = parse_cookie_header(r#"token="abc def""#);
        assert_eq!(cookies["token"], "abc def");
    }

    #[test]
    fn malformed_header_yields_empty_map() {
        assert!(parse_cookie_header("no-equals-here").is_empty());
        assert!(parse_cookie_header("ok=1; broken").is_empty());
        assert!(parse_cookie_header("=orphan-value").is_empty());
    }

    #[test]
    fn empty_header_yields_empty_map() {
        assert!(parse_cookie_header("").is_empty());
    }

    #[test]
    fn set_cookie_serializes_all_attributes() {
        let header = SetCookie::new("id", "42")
            .domain("example.com")
            .path("/api")
            .max_age_secs(60)
            .expires("Wed, 21 Oct 2026 07:28:00 GMT")
            .secure(true)
            .http_only(true)
            .same_site(SameSite::Lax)
            .to_header_value();

        assert_eq!(
            header,
            "id=42; Domain=example.com; Path=/api; Max-Age=60; \
             Expires=Wed, 21 Oct 2026 07:28:00 GMT; Secure; HttpOnly; SameSite=Lax"
        );
    }

    #[test]
    fn removal_cookie_has_zero_max_age() {
        let header = SetCookie::remove("session").to_header_value();
        assert_eq!(header, "session=; Max-Age=0");
    }

    #[test]
    fn from_str_splits_name_and_value() {
        assert_eq!(SetCookie::from("a=b"), SetCookie::new("a", "b"));
    }
}
