//! # Portico Core
//!
//! Core types for the Portico gateway request pipeline.
//!
//! This crate provides the foundational types used throughout Portico:
//!
//! - [`ProxyEvent`] - The inbound HTTP-gateway proxy event
//! - [`FunctionContext`] - Invocation metadata passed through to business code
//! - [`ResponseEnvelope`] - The outbound gateway response envelope
//! - [`PorticoError`] - Standard error type with wire-level classification

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod event;
mod path;

pub use error::{ErrorKind, PorticoError, PorticoResult};
pub use event::{FunctionContext, HeaderValue, ProxyEvent, ResponseEnvelope};
pub use path::{claim_at, event_value_at};
