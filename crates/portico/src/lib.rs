//! # Portico
//!
//! An API-gateway request pipeline for cloud-function invocations: method
//! routing, payload normalization, cookie parsing, token authentication,
//! per-section schema validation, and response formatting, composed into a
//! single handler that always answers with a gateway response envelope.
//!
//! A handler is declared once with [`ApiHandlerBuilder`] and then serves
//! every warm invocation:
//!
//! ```
//! use portico::{ApiHandlerBuilder, FieldRule, Reply, Schema, ValidationSpec};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let handler = ApiHandlerBuilder::new()
//!     .post(|event, _context| async move {
//!         let name = event.body["name"].as_str().unwrap_or_default().to_string();
//!         Ok(Reply::json(json!({"created": name})))
//!     })
//!     .validation(
//!         ValidationSpec::new()
//!             .body(Schema::new().field("name", FieldRule::string().trim().required())),
//!     )?
//!     .build()?;
//!
//! let event = serde_json::from_value(json!({
//!     "httpMethod": "POST",
//!     "body": "{\"name\": \"  Ada  \"}",
//! }))
//! .unwrap();
//!
//! let response = handler.handle(event, portico::FunctionContext::default()).await;
//! assert_eq!(response.status_code, 201);
//! # Ok::<(), portico::PorticoError>(())
//! # }).unwrap();
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod handler;
mod protection;
mod registry;
mod reply;
mod response;

pub use builder::ApiHandlerBuilder;
pub use handler::{ApiHandler, ErrorHook, FinallyHook, STAGES};
pub use protection::{ContentScanner, ProtectionMode, ScanFinding, SqlScanner};
pub use registry::{Executor, MethodHandler, MethodRegistry, ResponseHook, SUPPORTED_METHODS};
pub use reply::{Reply, ReplyBody};
pub use response::CorsOptions;

pub use portico_auth::{AuthConfig, AuthDefaults, AuthOptions, AuthValidator, Jwk};
pub use portico_core::{
    claim_at, event_value_at, ErrorKind, FunctionContext, HeaderValue, PorticoError,
    PorticoResult, ProxyEvent, ResponseEnvelope,
};
pub use portico_extract::{
    decode_body, normalize, parse_cookie_header, BodyDecodePolicy, SameSite, SetCookie,
};
pub use portico_validate::{
    EngineOptions, FieldKind, FieldRule, FieldRuleEngine, Schema, SchemaEngine, Section,
    SectionSet, ValidationFault, ValidationSpec,
};

/// The most commonly needed names, for glob import.
pub mod prelude {
    pub use crate::{
        ApiHandler, ApiHandlerBuilder, AuthDefaults, AuthOptions, CorsOptions, FieldRule,
        FunctionContext, PorticoError, PorticoResult, ProtectionMode, ProxyEvent, Reply,
        ResponseEnvelope, Schema, SetCookie, ValidationSpec,
    };
}
