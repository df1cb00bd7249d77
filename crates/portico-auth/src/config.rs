//! Authentication configuration resolution.
//!
//! Resolution runs once, at handler-definition time, and the result is
//! reused across warm invocations without being re-resolved. Precedence:
//!
//! 1. An explicit signing-key descriptor ([`Jwk`]), which must declare
//!    `RS256` and signature-use intent, else resolution fails.
//! 2. Explicit per-call options ([`AuthOptions`]): algorithm plus secret
//!    or public key.
//! 3. Injected ambient defaults ([`AuthDefaults`]), resolved by the caller
//!    (typically from the process environment) and passed in; this module
//!    never reads the environment on its own behalf.

use http::StatusCode;
use jsonwebtoken::{Algorithm, DecodingKey};
use portico_core::{PorticoError, PorticoResult};
use std::fmt;

/// Default dotted path of the bearer token on the event.
pub const DEFAULT_TOKEN_PATH: &str = "headers.Authorization";
/// Default dotted path of the inbound XSRF token on the event.
pub const DEFAULT_XSRF_TOKEN_PATH: &str = "headers.xsrf";
/// Default dotted path of the XSRF claim inside the decoded claims.
pub const DEFAULT_XSRF_CLAIM_PATH: &str = "nonce";

/// A single signing-key descriptor, as an alternative to supplying secret
/// or public-key material directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jwk {
    /// Declared algorithm; must be `RS256`.
    pub algorithm: String,
    /// Intended use; must be `sig`.
    pub intended_use: String,
    /// PEM-encoded public key material.
    pub key: String,
}

impl Jwk {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        algorithm: impl Into<String>,
        intended_use: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            algorithm: algorithm.into(),
            intended_use: intended_use.into(),
            key: key.into(),
        }
    }
}

/// Explicit per-handler authentication options.
#[derive(Debug, Clone, Default)]
pub struct AuthOptions {
    /// Token algorithm name (`HS256`, `HS384`, `HS512`, `RS256`).
    pub algorithm: Option<String>,
    /// Shared secret for `HS*` algorithms.
    pub secret: Option<String>,
    /// PEM-encoded public key for `RS256`.
    pub public_key: Option<String>,
    /// Signing-key descriptor; takes precedence over everything else.
    pub jwk: Option<Jwk>,
    /// Dotted path of the token on the event.
    pub token_path: Option<String>,
    /// Whether XSRF binding is enforced.
    pub xsrf: Option<bool>,
    /// Dotted path of the inbound XSRF token on the event.
    pub xsrf_token_path: Option<String>,
    /// Dotted path of the XSRF claim inside the decoded claims.
    pub xsrf_claim_path: Option<String>,
    /// HTTP status attached to authentication failures.
    pub failure_status: Option<StatusCode>,
}

impl AuthOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the algorithm name.
    #[must_use]
    pub fn algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Sets the shared secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the PEM-encoded public key.
    #[must_use]
    pub fn public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets the signing-key descriptor.
    #[must_use]
    pub fn jwk(mut self, jwk: Jwk) -> Self {
        self.jwk = Some(jwk);
        self
    }

    /// Sets the token path.
    #[must_use]
    pub fn token_path(mut self, path: impl Into<String>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Enables or disables XSRF binding.
    #[must_use]
    pub fn xsrf(mut self, enabled: bool) -> Self {
        self.xsrf = Some(enabled);
        self
    }

    /// Sets the inbound XSRF token path.
    #[must_use]
    pub fn xsrf_token_path(mut self, path: impl Into<String>) -> Self {
        self.xsrf_token_path = Some(path.into());
        self
    }

    /// Sets the XSRF claim path.
    #[must_use]
    pub fn xsrf_claim_path(mut self, path: impl Into<String>) -> Self {
        self.xsrf_claim_path = Some(path.into());
        self
    }

    /// Sets the HTTP status attached to authentication failures.
    #[must_use]
    pub fn failure_status(mut self, status: StatusCode) -> Self {
        self.failure_status = Some(status);
        self
    }

    fn is_empty(&self) -> bool {
        self.algorithm.is_none() && self.secret.is_none() && self.public_key.is_none()
            && self.jwk.is_none()
    }
}

/// Ambient authentication defaults, resolved by the caller.
///
/// The caller decides where these come from ([`from_env`](Self::from_env)
/// builds them from `PORTICO_JWT_*` environment variables) and passes the
/// result into [`AuthConfig::resolve`]. The resolver itself never reaches
/// for ambient state.
#[derive(Debug, Clone, Default)]
pub struct AuthDefaults {
    /// Default algorithm name.
    pub algorithm: Option<String>,
    /// Default shared secret.
    pub secret: Option<String>,
    /// Default PEM-encoded public key.
    pub public_key: Option<String>,
    /// Default token path.
    pub token_path: Option<String>,
    /// Default XSRF enablement.
    pub xsrf: Option<bool>,
    /// Default inbound XSRF token path.
    pub xsrf_token_path: Option<String>,
    /// Default XSRF claim path.
    pub xsrf_claim_path: Option<String>,
}

impl AuthDefaults {
    /// Defaults that provide nothing.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Builds defaults from `PORTICO_JWT_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            algorithm: var("PORTICO_JWT_ALGORITHM"),
            secret: var("PORTICO_JWT_SECRET"),
            public_key: var("PORTICO_JWT_PUBLIC_KEY"),
            token_path: var("PORTICO_JWT_TOKEN_PATH"),
            xsrf: var("PORTICO_JWT_USE_XSRF").map(|value| value == "true" || value == "1"),
            xsrf_token_path: var("PORTICO_JWT_XSRF_TOKEN_PATH"),
            xsrf_claim_path: var("PORTICO_JWT_XSRF_CLAIM_PATH"),
        }
    }

    /// Whether these defaults carry enough to enable authentication.
    #[must_use]
    pub fn provides_authentication(&self) -> bool {
        self.algorithm.is_some()
    }
}

/// The XSRF binding configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct XsrfBinding {
    pub(crate) token_path: String,
    pub(crate) claim_path: String,
}

pub(crate) struct EnabledAuth {
    pub(crate) algorithm: Algorithm,
    pub(crate) decoding_key: DecodingKey,
    pub(crate) token_path: String,
    pub(crate) xsrf: Option<XsrfBinding>,
    pub(crate) failure_status: StatusCode,
}

/// Resolved authentication configuration, immutable after construction.
pub struct AuthConfig {
    pub(crate) state: Option<EnabledAuth>,
}

impl AuthConfig {
    /// Authentication turned off: validation is a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self { state: None }
    }

    /// Resolves configuration from options and injected defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no algorithm can be resolved,
    /// when the resolved algorithm's key material is absent, or when a
    /// [`Jwk`] descriptor is malformed.
    pub fn resolve(options: &AuthOptions, defaults: &AuthDefaults) -> PorticoResult<Self> {
        if options.is_empty() && !defaults.provides_authentication() {
            return Ok(Self::disabled());
        }

        let (algorithm, decoding_key) = if let Some(jwk) = &options.jwk {
            resolve_jwk(jwk)?
        } else {
            resolve_key_material(options, defaults)?
        };

        let token_path = options
            .token_path
            .clone()
            .or_else(|| defaults.token_path.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string());

        let xsrf_enabled = options.xsrf.or(defaults.xsrf).unwrap_or(false);
        let xsrf = xsrf_enabled.then(|| XsrfBinding {
            token_path: options
                .xsrf_token_path
                .clone()
                .or_else(|| defaults.xsrf_token_path.clone())
                .unwrap_or_else(|| DEFAULT_XSRF_TOKEN_PATH.to_string()),
            claim_path: options
                .xsrf_claim_path
                .clone()
                .or_else(|| defaults.xsrf_claim_path.clone())
                .unwrap_or_else(|| DEFAULT_XSRF_CLAIM_PATH.to_string()),
        });

        Ok(Self {
            state: Some(EnabledAuth {
                algorithm,
                decoding_key,
                token_path,
                xsrf,
                failure_status: options.failure_status.unwrap_or(StatusCode::FORBIDDEN),
            }),
        })
    }

    /// Whether authentication is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// The dotted token path, when enabled.
    #[must_use]
    pub fn token_path(&self) -> Option<&str> {
        self.state.as_ref().map(|state| state.token_path.as_str())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            None => f.debug_struct("AuthConfig").field("enabled", &false).finish(),
            Some(state) => f
                .debug_struct("AuthConfig")
                .field("enabled", &true)
                .field("algorithm", &state.algorithm)
                .field("token_path", &state.token_path)
                .field("xsrf", &state.xsrf)
                .field("failure_status", &state.failure_status)
                .finish_non_exhaustive(),
        }
    }
}

fn resolve_jwk(jwk: &Jwk) -> PorticoResult<(Algorithm, DecodingKey)> {
    if !jwk.algorithm.eq_ignore_ascii_case("RS256") {
        return Err(PorticoError::configuration(format!(
            "jwk algorithm must be RS256, got: {}",
            jwk.algorithm
        )));
    }
    if jwk.intended_use != "sig" {
        return Err(PorticoError::configuration(format!(
            "jwk use must be sig, got: {}",
            jwk.intended_use
        )));
    }
    let key = DecodingKey::from_rsa_pem(jwk.key.as_bytes())
        .map_err(|error| PorticoError::configuration(format!("invalid jwk key material: {error}")))?;
    Ok((Algorithm::RS256, key))
}

fn resolve_key_material(
    options: &AuthOptions,
    defaults: &AuthDefaults,
) -> PorticoResult<(Algorithm, DecodingKey)> {
    let name = options
        .algorithm
        .clone()
        .or_else(|| defaults.algorithm.clone())
        .ok_or_else(|| PorticoError::configuration("missing algorithm"))?;

    let algorithm = match name.to_ascii_uppercase().as_str() {
        "HS256" => Algorithm::HS256,
        "HS384" => Algorithm::HS384,
        "HS512" => Algorithm::HS512,
        "RS256" => Algorithm::RS256,
        other => {
            return Err(PorticoError::configuration(format!(
                "unsupported algorithm: {other}"
            )))
        }
    };

    let key = match algorithm {
        Algorithm::RS256 => {
            let pem = options
                .public_key
                .clone()
                .or_else(|| defaults.public_key.clone())
                .ok_or_else(|| PorticoError::configuration("missing public key"))?;
            DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|error| {
                PorticoError::configuration(format!("invalid public key: {error}"))
            })?
        }
        _ => {
            let secret = options
                .secret
                .clone()
                .or_else(|| defaults.secret.clone())
                .ok_or_else(|| PorticoError::configuration("missing secret"))?;
            DecodingKey::from_secret(secret.as_bytes())
        }
    };

    Ok((algorithm, key))
}
