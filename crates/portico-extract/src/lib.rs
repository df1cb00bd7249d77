//! # Portico Extract
//!
//! Request normalization for the Portico gateway pipeline:
//!
//! - [`normalize`] - payload-encoding normalization of the inbound event
//! - [`decode_body`] / [`BodyDecodePolicy`] - content-sniffing body decoding
//! - [`parse_cookie_header`] / [`SetCookie`] - cookie parsing and serialization

#![doc(html_root_url = "https://docs.rs/portico-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod cookie;
mod normalize;

pub use body::{decode_body, BodyDecodePolicy};
pub use cookie::{parse_cookie_header, SameSite, SetCookie};
pub use normalize::normalize;
