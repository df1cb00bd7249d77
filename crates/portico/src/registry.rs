//! Per-method handler registry.

use crate::reply::Reply;
use indexmap::IndexMap;
use portico_core::{FunctionContext, HeaderValue, PorticoError, PorticoResult, ProxyEvent, ResponseEnvelope};
use portico_pipeline::BoxFuture;
use portico_validate::SectionSet;
use std::collections::HashMap;
use std::sync::Arc;

/// A boxed business executor: receives the processed event and the
/// invocation context, returns a [`Reply`].
pub type Executor =
    Arc<dyn Fn(ProxyEvent, FunctionContext) -> BoxFuture<'static, PorticoResult<Reply>> + Send + Sync>;

/// A per-method response hook: receives the assembled envelope and may
/// return a replacement.
pub type ResponseHook =
    Arc<dyn Fn(ResponseEnvelope) -> BoxFuture<'static, PorticoResult<ResponseEnvelope>> + Send + Sync>;

/// The bundle attached to one HTTP method: section validators, the business
/// executor, the response hook, and method-specific response headers.
pub struct MethodHandler {
    pub(crate) sections: Option<Arc<SectionSet>>,
    pub(crate) executor: Executor,
    pub(crate) on_response: Option<ResponseHook>,
    pub(crate) headers: IndexMap<String, HeaderValue>,
}

/// HTTP methods a handler can register for.
pub const SUPPORTED_METHODS: [&str; 6] = ["GET", "PUT", "POST", "DELETE", "HEAD", "PATCH"];

/// Immutable per-method handler table, built once at definition time and
/// reused across warm invocations.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<String, Arc<MethodHandler>>,
}

impl MethodRegistry {
    /// Normalizes a method name to uppercase, rejecting unsupported names.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the method when it is not one
    /// of [`SUPPORTED_METHODS`].
    pub fn normalize(method: &str) -> PorticoResult<String> {
        let normalized = method.trim().to_ascii_uppercase();
        if SUPPORTED_METHODS.contains(&normalized.as_str()) {
            Ok(normalized)
        } else {
            Err(PorticoError::configuration(format!(
                "unsupported http method: {method}"
            )))
        }
    }

    pub(crate) fn insert(&mut self, method: String, handler: MethodHandler) {
        self.handlers.insert(method, Arc::new(handler));
    }

    /// Looks up the handler for an already-uppercased method name.
    #[must_use]
    pub(crate) fn lookup(&self, method: &str) -> Option<Arc<MethodHandler>> {
        self.handlers.get(method).cloned()
    }

    /// The registered method names.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    /// Whether no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
