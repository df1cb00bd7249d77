//! # Portico Auth
//!
//! Token-based authentication for the Portico gateway pipeline.
//!
//! Configuration is resolved once per handler instance by
//! [`AuthConfig::resolve`], with a fixed precedence: an explicit signing-key
//! descriptor ([`Jwk`]), then explicit per-call [`AuthOptions`], then an
//! injected [`AuthDefaults`] provider. The resolved [`AuthValidator`] then
//! validates every invocation's token, including the optional XSRF binding,
//! and attaches the decoded claims to the event.

#![doc(html_root_url = "https://docs.rs/portico-auth/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod validator;

pub use config::{AuthConfig, AuthDefaults, AuthOptions, Jwk};
pub use validator::AuthValidator;
