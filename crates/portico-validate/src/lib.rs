//! # Portico Validate
//!
//! Per-section request validation for the Portico gateway pipeline.
//!
//! A [`ValidationSpec`] declares schemas for the distinct sections of a
//! request (headers, query, body, path parameters, and the multi-value
//! header/query variants). A [`SectionSet`] compiles the spec into an
//! ordered list of section validators that run against an event, coerce
//! values in place, and fail with client-facing 400 errors.
//!
//! The underlying schema engine is a collaborator behind the
//! [`SchemaEngine`] trait; [`FieldRuleEngine`] is the built-in
//! implementation.

#![doc(html_root_url = "https://docs.rs/portico-validate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod engine;
mod schema;
mod section;

pub use engine::{EngineOptions, FieldRuleEngine, SchemaEngine, ValidationFault};
pub use schema::{FieldKind, FieldRule, Schema};
pub use section::{Section, SectionSet, ValidationSpec};
