//! Business-result type.
//!
//! An executor returns a [`Reply`]: an explicitly tagged body plus optional
//! status, headers, and cookies. There is no structural sniffing of "does
//! this look like a response object"; what the formatter should do is stated
//! by the type.

use indexmap::IndexMap;
use portico_core::HeaderValue;
use portico_extract::SetCookie;
use serde_json::Value;

/// The payload of a reply.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReplyBody {
    /// No payload.
    #[default]
    Empty,
    /// A plain-text payload, sent verbatim.
    Text(String),
    /// A structured payload, serialized as JSON.
    Json(Value),
    /// A binary payload, base64-encoded into the envelope with
    /// `isBase64Encoded` set.
    Binary(Vec<u8>),
}

/// What a business executor hands back to the response formatter.
///
/// Status and headers are optional; the formatter fills in method-derived
/// defaults for anything left unset.
///
/// # Example
///
/// ```
/// use portico::Reply;
/// use serde_json::json;
///
/// let reply = Reply::json(json!({"id": 7}))
///     .status(201)
///     .header("Location", "/widgets/7");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub(crate) status: Option<u16>,
    pub(crate) headers: IndexMap<String, HeaderValue>,
    pub(crate) body: ReplyBody,
    pub(crate) cookies: Vec<SetCookie>,
}

impl Reply {
    /// An empty reply; the status falls back to the method default.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A plain-text reply.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            body: ReplyBody::Text(body.into()),
            ..Self::default()
        }
    }

    /// A structured JSON reply.
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self {
            body: ReplyBody::Json(body),
            ..Self::default()
        }
    }

    /// A binary reply; the formatter base64-encodes it.
    #[must_use]
    pub fn binary(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: ReplyBody::Binary(body.into()),
            ..Self::default()
        }
    }

    /// Sets an explicit status code, overriding the method default.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a response header. Reply headers win over handler and method
    /// headers on conflict.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attaches a `Set-Cookie` entry.
    #[must_use]
    pub fn cookie(mut self, cookie: SetCookie) -> Self {
        self.cookies.push(cookie);
        self
    }
}

impl From<&str> for Reply {
    fn from(body: &str) -> Self {
        Self::text(body)
    }
}

impl From<String> for Reply {
    fn from(body: String) -> Self {
        Self::text(body)
    }
}

impl From<Value> for Reply {
    fn from(body: Value) -> Self {
        Self::json(body)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(body: Vec<u8>) -> Self {
        Self::binary(body)
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::empty()
    }
}
