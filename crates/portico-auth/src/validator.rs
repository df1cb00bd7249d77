//! Token validation.

use crate::config::AuthConfig;
use chrono::Utc;
use jsonwebtoken::Validation;
use portico_core::{claim_at, event_value_at, PorticoError, PorticoResult, ProxyEvent};
use serde_json::Value;

/// Validates signed tokens against a resolved [`AuthConfig`].
///
/// Configuration is resolved once; `validate` runs per invocation and
/// never re-resolves. On success the decoded claims are attached to the
/// event's `jwt` field.
pub struct AuthValidator {
    config: AuthConfig,
}

impl AuthValidator {
    /// Creates a validator over a resolved configuration.
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Whether authentication is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Validates the event's token; a no-op when authentication is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns an authentication error (with the configured failure
    /// status) when the token is missing, fails decode or signature
    /// verification, carries an issued-at timestamp in the future, or
    /// fails the XSRF binding. Each XSRF failure mode has a distinct
    /// message: missing token, missing claim, or mismatch.
    pub fn validate(&self, event: &mut ProxyEvent) -> PorticoResult<()> {
        let Some(state) = &self.config.state else {
            return Ok(());
        };
        let fail = |message: String| {
            PorticoError::authentication(message).with_status(state.failure_status)
        };

        let raw = event_value_at(event, &state.token_path)
            .ok_or_else(|| fail("missing jwt token".to_string()))?;
        let token = raw
            .strip_prefix("Bearer")
            .map_or_else(|| raw.trim(), str::trim);

        let mut validation = Validation::new(state.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.leeway = 0;

        let decoded = jsonwebtoken::decode::<Value>(token, &state.decoding_key, &validation)
            .map_err(|error| fail(format!("invalid jwt token: {error}")))?;
        let claims = decoded.claims;

        if let Some(iat) = claims.get("iat").and_then(Value::as_i64) {
            if iat > Utc::now().timestamp() {
                return Err(fail("token used before issue date".to_string()));
            }
        }

        tracing::debug!(algorithm = ?state.algorithm, "jwt decoded and verified");

        if let Some(xsrf) = &state.xsrf {
            let provided = event_value_at(event, &xsrf.token_path)
                .ok_or_else(|| fail("missing xsrf token".to_string()))?;
            let expected = claim_at(&claims, &xsrf.claim_path)
                .filter(|value| !value.is_null())
                .ok_or_else(|| fail("missing xsrf claim".to_string()))?;
            let expected = match expected {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if expected != provided {
                return Err(fail("xsrf token mismatch".to_string()));
            }
        }

        event.jwt = Some(claims);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthDefaults, AuthOptions};
    use http::StatusCode;
    use jsonwebtoken::{Algorithm, EncodingKey, Header};
    use serde_json::json;

    fn sign(claims: &Value, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator(options: AuthOptions) -> AuthValidator {
        AuthValidator::new(AuthConfig::resolve(&options, &AuthDefaults::none()).unwrap())
    }

    fn hs256(secret: &str) -> AuthValidator {
        validator(AuthOptions::new().algorithm("HS256").secret(secret))
    }

    fn future_exp() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test]
    fn disabled_validator_is_a_no_op() {
        let validator = AuthValidator::new(AuthConfig::disabled());
        let mut event = ProxyEvent::for_method("GET");
        validator.validate(&mut event).unwrap();
        assert!(event.jwt.is_none());
    }

    #[test]
    fn valid_token_attaches_claims() {
        let claims = json!({"sub": "user-1", "exp": future_exp()});
        let token = sign(&claims, "secret");

        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", format!("Bearer {token}"));

        hs256("secret").validate(&mut event).unwrap();
        assert_eq!(event.jwt.as_ref().unwrap()["sub"], json!("user-1"));
    }

    #[test]
    fn token_without_bearer_prefix_is_accepted() {
        let token = sign(&json!({"exp": future_exp()}), "secret");
        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", token);

        hs256("secret").validate(&mut event).unwrap();
        assert!(event.jwt.is_some());
    }

    #[test]
    fn missing_token_fails_with_configured_status() {
        let mut event = ProxyEvent::for_method("GET");
        let err = hs256("secret").validate(&mut event).unwrap_err();
        assert_eq!(
            err.to_string(),
            "authentication error: missing jwt token"
        );
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.wire_type(), "AuthenticationFailureError");
    }

    #[test]
    fn failure_status_override_is_applied() {
        let validator = validator(
            AuthOptions::new()
                .algorithm("HS256")
                .secret("secret")
                .failure_status(StatusCode::UNAUTHORIZED),
        );
        let mut event = ProxyEvent::for_method("GET");
        let err = validator.validate(&mut event).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let token = sign(&json!({"exp": future_exp()}), "other-secret");
        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", format!("Bearer {token}"));

        let err = hs256("secret").validate(&mut event).unwrap_err();
        assert!(err.to_string().contains("invalid jwt token"));
        assert!(event.jwt.is_none());
    }

    #[test]
    fn token_signed_with_a_different_algorithm_is_rejected() {
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS384),
            &json!({"exp": future_exp()}),
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", format!("Bearer {token}"));

        let err = hs256("secret").validate(&mut event).unwrap_err();
        assert!(err.to_string().contains("invalid jwt token"));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let token = sign(&json!({"sub": "user-1", "exp": future_exp()}), "secret");
        let mut parts: Vec<&str> = token.split('.').collect();
        let tampered_payload = "eyJzdWIiOiJhZG1pbiJ9";
        parts[1] = tampered_payload;
        let tampered = parts.join(".");

        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", format!("Bearer {tampered}"));

        assert!(hs256("secret").validate(&mut event).is_err());
    }

    #[test]
    fn expired_token_is_rejected_by_decode() {
        let token = sign(&json!({"exp": Utc::now().timestamp() - 10}), "secret");
        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", format!("Bearer {token}"));

        let err = hs256("secret").validate(&mut event).unwrap_err();
        assert!(err.to_string().contains("invalid jwt token"));
    }

    #[test]
    fn future_issued_at_is_rejected() {
        let claims = json!({
            "exp": future_exp(),
            "iat": Utc::now().timestamp() + 600,
        });
        let token = sign(&claims, "secret");
        let mut event = ProxyEvent::for_method("GET");
        event.set_header("Authorization", format!("Bearer {token}"));

        let err = hs256("secret").validate(&mut event).unwrap_err();
        assert_eq!(
            err.to_string(),
            "authentication error: token used before issue date"
        );
    }

    fn xsrf_validator() -> AuthValidator {
        validator(
            AuthOptions::new()
                .algorithm("HS256")
                .secret("secret")
                .xsrf(true),
        )
    }

    fn xsrf_event(token_claims: &Value, xsrf_header: Option<&str>) -> ProxyEvent {
        let mut event = ProxyEvent::for_method("POST");
        event.set_header("Authorization", format!("Bearer {}", sign(token_claims, "secret")));
        if let Some(value) = xsrf_header {
            event.set_header("xsrf", value);
        }
        event
    }

    #[test]
    fn matching_xsrf_token_and_claim_pass() {
        let mut event = xsrf_event(
            &json!({"exp": future_exp(), "nonce": "n-1"}),
            Some("n-1"),
        );
        xsrf_validator().validate(&mut event).unwrap();
        assert!(event.jwt.is_some());
    }

    #[test]
    fn missing_xsrf_token_fails_distinctly() {
        let mut event = xsrf_event(&json!({"exp": future_exp(), "nonce": "n-1"}), None);
        let err = xsrf_validator().validate(&mut event).unwrap_err();
        assert_eq!(err.to_string(), "authentication error: missing xsrf token");
    }

    #[test]
    fn missing_xsrf_claim_fails_distinctly() {
        let mut event = xsrf_event(&json!({"exp": future_exp()}), Some("n-1"));
        let err = xsrf_validator().validate(&mut event).unwrap_err();
        assert_eq!(err.to_string(), "authentication error: missing xsrf claim");
    }

    #[test]
    fn diverging_xsrf_values_fail_distinctly() {
        let mut event = xsrf_event(
            &json!({"exp": future_exp(), "nonce": "n-1"}),
            Some("n-2"),
        );
        let err = xsrf_validator().validate(&mut event).unwrap_err();
        assert_eq!(err.to_string(), "authentication error: xsrf token mismatch");
    }

    #[test]
    fn custom_claim_path_is_honored() {
        let validator = validator(
            AuthOptions::new()
                .algorithm("HS256")
                .secret("secret")
                .xsrf(true)
                .xsrf_claim_path("session.nonce"),
        );
        let mut event = xsrf_event(
            &json!({"exp": future_exp(), "session": {"nonce": "deep"}}),
            Some("deep"),
        );
        validator.validate(&mut event).unwrap();
    }
}
