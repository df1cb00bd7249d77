//! Error types for the Portico pipeline.
//!
//! Every failure in the pipeline is a [`PorticoError`] classified by
//! [`ErrorKind`]. The kind determines the default HTTP status and the wire
//! `type` name the response formatter serializes; both can be overridden on
//! the error itself, which is how the `on_error` hook attaches a status or a
//! replacement body.

use http::StatusCode;
use serde_json::Value;
use std::fmt;

/// Result type alias using [`PorticoError`].
pub type PorticoResult<T> = Result<T, PorticoError>;

/// Classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed handler configuration, detected at definition time.
    Configuration,
    /// No handler registered for the inbound HTTP method.
    Routing,
    /// Missing, invalid, or expired token; XSRF mismatch.
    Authentication,
    /// Schema violation in a request section.
    Validation,
    /// Failure raised by user code.
    Business,
}

impl ErrorKind {
    /// Returns the default HTTP status code for this kind.
    ///
    /// Authentication failures default to 403; the status is carried on the
    /// error and can be reconfigured per handler, so the default here is a
    /// starting point, not a hard-wired mapping.
    #[must_use]
    pub const fn default_status_code(self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::FORBIDDEN,
            Self::Configuration | Self::Routing | Self::Business => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the wire-level `type` name serialized into error bodies.
    #[must_use]
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::Routing => "RoutingError",
            Self::Authentication => "AuthenticationFailureError",
            Self::Validation => "ValidationError",
            Self::Business => "Error",
        }
    }
}

/// Standard error type for the Portico pipeline.
///
/// Carries a kind, a message, and optional overrides for the HTTP status,
/// the wire `type` name, and the response body. The response formatter reads
/// these via [`status`](Self::status), [`wire_type`](Self::wire_type), and
/// [`body`](Self::body).
///
/// # Example
///
/// ```
/// use portico_core::PorticoError;
/// use http::StatusCode;
///
/// let err = PorticoError::authentication("missing jwt token");
/// assert_eq!(err.status(), StatusCode::FORBIDDEN);
/// assert_eq!(err.wire_type(), "AuthenticationFailureError");
/// assert_eq!(err.to_string(), "authentication error: missing jwt token");
/// ```
#[derive(Debug)]
pub struct PorticoError {
    kind: ErrorKind,
    message: String,
    status: Option<StatusCode>,
    wire_type: Option<String>,
    body: Option<Value>,
    source: Option<anyhow::Error>,
}

impl PorticoError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            wire_type: None,
            body: None,
            source: None,
        }
    }

    /// Creates a configuration error (fatal at handler-definition time).
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Creates a routing error for an unregistered HTTP method.
    #[must_use]
    pub fn routing(method: impl Into<String>) -> Self {
        Self::new(ErrorKind::Routing, method.into())
    }

    /// Creates an authentication failure.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Creates a validation failure. The message should name the offending
    /// field.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Creates a business error from a message.
    #[must_use]
    pub fn business(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Business, message)
    }

    /// Creates a business error wrapping an opaque source error.
    #[must_use]
    pub fn from_source(source: anyhow::Error) -> Self {
        let message = source.to_string();
        Self {
            source: Some(source),
            ..Self::new(ErrorKind::Business, message)
        }
    }

    /// Overrides the HTTP status for this error.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Overrides the wire `type` name for this error.
    #[must_use]
    pub fn with_wire_type(mut self, wire_type: impl Into<String>) -> Self {
        self.wire_type = Some(wire_type.into());
        self
    }

    /// Supplies an explicit response body, bypassing the default
    /// `{type, message}` shape.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the effective HTTP status: the override if set, otherwise the
    /// kind's default.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or_else(|| self.kind.default_status_code())
    }

    /// Returns the effective wire `type` name.
    #[must_use]
    pub fn wire_type(&self) -> &str {
        self.wire_type
            .as_deref()
            .unwrap_or_else(|| self.kind.wire_type())
    }

    /// Returns the explicit response body, if one was attached.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

impl fmt::Display for PorticoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Configuration => write!(f, "configuration error: {}", self.message),
            ErrorKind::Routing => {
                write!(f, "handler not defined for http method: {}", self.message)
            }
            ErrorKind::Authentication => write!(f, "authentication error: {}", self.message),
            ErrorKind::Validation => write!(f, "validation error: {}", self.message),
            ErrorKind::Business => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for PorticoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(anyhow::Error::as_ref)
    }
}

impl From<anyhow::Error> for PorticoError {
    fn from(source: anyhow::Error) -> Self {
        Self::from_source(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_default_statuses() {
        assert_eq!(
            ErrorKind::Validation.default_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorKind::Authentication.default_status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorKind::Routing.default_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorKind::Business.default_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn routing_message_names_the_method() {
        let err = PorticoError::routing("PATCH");
        assert_eq!(
            err.to_string(),
            "handler not defined for http method: PATCH"
        );
        assert_eq!(err.wire_type(), "RoutingError");
    }

    #[test]
    fn status_override_wins_over_kind_default() {
        let err = PorticoError::authentication("missing jwt token")
            .with_status(StatusCode::UNAUTHORIZED);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn explicit_body_is_preserved() {
        let err = PorticoError::business("boom").with_body(json!({"detail": "boom"}));
        assert_eq!(err.body(), Some(&json!({"detail": "boom"})));
    }

    #[test]
    fn validation_display_names_field() {
        let err = PorticoError::validation("required value missing: age");
        assert_eq!(
            err.to_string(),
            "validation error: required value missing: age"
        );
        assert_eq!(err.wire_type(), "ValidationError");
    }
}
