//! Fluent handler definition.
//!
//! [`ApiHandlerBuilder`] collects per-method executors, validation specs,
//! hooks, and handler-wide configuration, then compiles everything into an
//! immutable [`ApiHandler`] at [`build`](ApiHandlerBuilder::build) time.
//! Configuration mistakes fail the build; nothing is deferred to the first
//! invocation.
//!
//! The builder tracks the most recently registered method explicitly:
//! `validation`, `handler`, and `on_response` apply to that method and fail
//! with a configuration error when no method has been registered yet.

use crate::handler::{ApiHandler, ErrorHook, FinallyHook, HandlerConfig};
use crate::protection::{ContentScanner, Protection, ProtectionMode, SqlScanner};
use crate::registry::{Executor, MethodHandler, MethodRegistry, ResponseHook};
use crate::reply::Reply;
use crate::response::CorsOptions;
use indexmap::IndexMap;
use portico_auth::{AuthConfig, AuthDefaults, AuthOptions, AuthValidator};
use portico_core::{
    FunctionContext, HeaderValue, PorticoError, PorticoResult, ProxyEvent, ResponseEnvelope,
};
use portico_extract::BodyDecodePolicy;
use portico_validate::{FieldRuleEngine, SchemaEngine, SectionSet, ValidationSpec};
use std::future::Future;
use std::sync::Arc;

struct MethodDraft {
    spec: Option<ValidationSpec>,
    executor: Executor,
    on_response: Option<ResponseHook>,
    headers: IndexMap<String, HeaderValue>,
}

/// Builder for [`ApiHandler`].
///
/// # Example
///
/// ```
/// use portico::{ApiHandlerBuilder, FieldRule, Reply, Schema, ValidationSpec};
///
/// let handler = ApiHandlerBuilder::new()
///     .get(|_event, _context| async { Ok(Reply::text("hello")) })
///     .put(|_event, _context| async { Ok("put called") })
///     .validation(
///         ValidationSpec::new()
///             .body(Schema::new().field("name", FieldRule::string().trim().required())),
///     )
///     .unwrap()
///     .build()
///     .unwrap();
/// # let _ = handler;
/// ```
pub struct ApiHandlerBuilder {
    methods: IndexMap<String, MethodDraft>,
    current: Option<String>,
    default_headers: IndexMap<String, HeaderValue>,
    body_policy: BodyDecodePolicy,
    protection_mode: ProtectionMode,
    scanner: Arc<dyn ContentScanner>,
    engine: Arc<dyn SchemaEngine>,
    auth: AuthOptions,
    auth_disabled: bool,
    auth_defaults: AuthDefaults,
    on_error: Option<ErrorHook>,
    finally: Option<FinallyHook>,
}

impl std::fmt::Debug for ApiHandlerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandlerBuilder").finish_non_exhaustive()
    }
}

impl Default for ApiHandlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiHandlerBuilder {
    /// Creates a builder with no methods registered.
    ///
    /// Defaults: injection scanning in report mode, content-sniffing body
    /// decoding, authentication resolved from the injected defaults (none
    /// unless [`auth_defaults`](Self::auth_defaults) provides some).
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: IndexMap::new(),
            current: None,
            default_headers: IndexMap::new(),
            body_policy: BodyDecodePolicy::Auto,
            protection_mode: ProtectionMode::Report,
            scanner: Arc::new(SqlScanner::new()),
            engine: Arc::new(FieldRuleEngine::new()),
            auth: AuthOptions::new(),
            auth_disabled: false,
            auth_defaults: AuthDefaults::none(),
            on_error: None,
            finally: None,
        }
    }

    /// Registers an executor for an arbitrary method name and selects the
    /// method for subsequent `validation`/`handler`/`on_response` calls.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the method is not supported.
    pub fn method<F, Fut, R>(mut self, method: &str, executor: F) -> PorticoResult<Self>
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        let method = MethodRegistry::normalize(method)?;
        self.insert_draft(method, wrap_executor(executor));
        Ok(self)
    }

    fn insert_draft(&mut self, method: String, executor: Executor) {
        self.methods.insert(
            method.clone(),
            MethodDraft {
                spec: None,
                executor,
                on_response: None,
                headers: IndexMap::new(),
            },
        );
        self.current = Some(method);
    }

    fn register<F, Fut, R>(mut self, method: &'static str, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.insert_draft(method.to_string(), wrap_executor(executor));
        self
    }

    /// Registers the `GET` executor.
    #[must_use]
    pub fn get<F, Fut, R>(self, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.register("GET", executor)
    }

    /// Registers the `PUT` executor.
    #[must_use]
    pub fn put<F, Fut, R>(self, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.register("PUT", executor)
    }

    /// Registers the `POST` executor.
    #[must_use]
    pub fn post<F, Fut, R>(self, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.register("POST", executor)
    }

    /// Registers the `DELETE` executor.
    #[must_use]
    pub fn delete<F, Fut, R>(self, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.register("DELETE", executor)
    }

    /// Registers the `HEAD` executor.
    #[must_use]
    pub fn head<F, Fut, R>(self, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.register("HEAD", executor)
    }

    /// Registers the `PATCH` executor.
    #[must_use]
    pub fn patch<F, Fut, R>(self, executor: F) -> Self
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.register("PATCH", executor)
    }

    fn current_draft(&mut self) -> PorticoResult<&mut MethodDraft> {
        let Some(current) = self.current.clone() else {
            return Err(PorticoError::configuration("method not selected"));
        };
        self.methods
            .get_mut(&current)
            .ok_or_else(|| PorticoError::configuration("method not selected"))
    }

    /// Attaches a validation spec to the most recently registered method.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no method has been registered.
    pub fn validation(mut self, spec: ValidationSpec) -> PorticoResult<Self> {
        self.current_draft()?.spec = Some(spec);
        Ok(self)
    }

    /// Replaces the executor of the most recently registered method.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no method has been registered.
    pub fn handler<F, Fut, R>(mut self, executor: F) -> PorticoResult<Self>
    where
        F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<R>> + Send + 'static,
        R: Into<Reply>,
    {
        self.current_draft()?.executor = wrap_executor(executor);
        Ok(self)
    }

    /// Attaches a response hook to the most recently registered method. The
    /// hook sees the assembled envelope, on both the success and the failure
    /// path, and may return a replacement.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no method has been registered.
    pub fn on_response<F, Fut>(mut self, hook: F) -> PorticoResult<Self>
    where
        F: Fn(ResponseEnvelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoResult<ResponseEnvelope>> + Send + 'static,
    {
        self.current_draft()?.on_response =
            Some(Arc::new(move |envelope| Box::pin(hook(envelope))));
        Ok(self)
    }

    /// Adds a response header. Before any method is registered this is a
    /// handler-wide default; afterwards it applies to the most recently
    /// registered method and wins over the defaults on conflict.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        let name = name.into();
        let value = value.into();
        let draft = self
            .current
            .as_ref()
            .and_then(|method| self.methods.get_mut(method));
        match draft {
            Some(draft) => {
                draft.headers.insert(name, value);
            }
            None => {
                self.default_headers.insert(name, value);
            }
        }
        self
    }

    /// Adds several response headers; same scoping as [`header`](Self::header).
    #[must_use]
    pub fn headers<N, V>(mut self, entries: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<HeaderValue>,
    {
        for (name, value) in entries {
            self = self.header(name, value);
        }
        self
    }

    /// Merges cross-origin response headers into the handler-wide defaults.
    #[must_use]
    pub fn cors(mut self, options: CorsOptions) -> Self {
        for (name, value) in options.into_headers() {
            self.default_headers.insert(name, value);
        }
        self
    }

    /// Enables token authentication with explicit options.
    #[must_use]
    pub fn jwt(mut self, options: AuthOptions) -> Self {
        self.auth = options;
        self.auth_disabled = false;
        self
    }

    /// Disables token authentication even when the injected defaults would
    /// enable it.
    #[must_use]
    pub fn no_jwt(mut self) -> Self {
        self.auth_disabled = true;
        self
    }

    /// Alias for [`jwt`](Self::jwt).
    #[must_use]
    pub fn requires_authorization(self, options: AuthOptions) -> Self {
        self.jwt(options)
    }

    /// Injects ambient authentication defaults, typically
    /// [`AuthDefaults::from_env`].
    #[must_use]
    pub fn auth_defaults(mut self, defaults: AuthDefaults) -> Self {
        self.auth_defaults = defaults;
        self
    }

    /// Forces form-urlencoded body decoding instead of content sniffing.
    #[must_use]
    pub fn form_url_encoded(mut self, enabled: bool) -> Self {
        self.body_policy = if enabled {
            BodyDecodePolicy::FormUrlEncoded
        } else {
            BodyDecodePolicy::Auto
        };
        self
    }

    /// Disables body decoding entirely; the body stays the raw string.
    #[must_use]
    pub fn skip_body_parse(mut self) -> Self {
        self.body_policy = BodyDecodePolicy::None;
        self
    }

    /// Sets the injection-scan mode.
    #[must_use]
    pub fn protection(mut self, mode: ProtectionMode) -> Self {
        self.protection_mode = mode;
        self
    }

    /// Replaces the content scanner used by the protection stage.
    #[must_use]
    pub fn scanner(mut self, scanner: Arc<dyn ContentScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Replaces the schema engine used to compile validation specs.
    #[must_use]
    pub fn schema_engine(mut self, engine: Arc<dyn SchemaEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Registers the error hook: it receives every pipeline or executor
    /// failure and may replace it (attach a status, a wire type, or a body)
    /// before formatting.
    #[must_use]
    pub fn on_error<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PorticoError, ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PorticoError> + Send + 'static,
    {
        self.on_error = Some(Arc::new(move |error, event, context| {
            Box::pin(hook(error, event, context))
        }));
        self
    }

    /// Registers a cleanup hook that runs exactly once per invocation, after
    /// the envelope is assembled. Failures are logged and swallowed.
    #[must_use]
    pub fn finally<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.finally = Some(Arc::new(move || Box::pin(hook())));
        self
    }

    /// Compiles the builder into an immutable [`ApiHandler`].
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no method is registered or when
    /// authentication options cannot be resolved.
    pub fn build(self) -> PorticoResult<ApiHandler> {
        if self.methods.is_empty() {
            return Err(PorticoError::configuration("no handler methods registered"));
        }

        let auth = if self.auth_disabled {
            AuthConfig::disabled()
        } else {
            AuthConfig::resolve(&self.auth, &self.auth_defaults)?
        };

        let mut registry = MethodRegistry::default();
        for (method, draft) in self.methods {
            let sections = draft
                .spec
                .map(|spec| Arc::new(SectionSet::compile(spec, Arc::clone(&self.engine))));
            registry.insert(
                method,
                MethodHandler {
                    sections,
                    executor: draft.executor,
                    on_response: draft.on_response,
                    headers: draft.headers,
                },
            );
        }

        ApiHandler::assemble(HandlerConfig {
            registry,
            auth: AuthValidator::new(auth),
            body_policy: self.body_policy,
            protection: Protection::new(self.protection_mode, self.scanner),
            default_headers: self.default_headers,
            on_error: self.on_error,
            finally: self.finally,
        })
    }
}

fn wrap_executor<F, Fut, R>(executor: F) -> Executor
where
    F: Fn(ProxyEvent, FunctionContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = PorticoResult<R>> + Send + 'static,
    R: Into<Reply>,
{
    Arc::new(move |event, context| {
        let future = executor(event, context);
        Box::pin(async move { future.await.map(Into::into) })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_before_any_method_is_a_configuration_error() {
        let err = ApiHandlerBuilder::new()
            .validation(ValidationSpec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "configuration error: method not selected");
    }

    #[test]
    fn on_response_before_any_method_is_a_configuration_error() {
        let err = ApiHandlerBuilder::new()
            .on_response(|envelope| async move { Ok(envelope) })
            .unwrap_err();
        assert_eq!(err.to_string(), "configuration error: method not selected");
    }

    #[test]
    fn build_without_methods_fails() {
        let err = ApiHandlerBuilder::new().build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: no handler methods registered"
        );
    }

    #[test]
    fn unsupported_method_name_fails_registration() {
        let err = ApiHandlerBuilder::new()
            .method("TRACE", |_event, _context| async { Ok(Reply::empty()) })
            .unwrap_err();
        assert!(err.to_string().contains("unsupported http method: TRACE"));
    }

    #[test]
    fn bad_auth_options_fail_the_build() {
        let err = ApiHandlerBuilder::new()
            .get(|_event, _context| async { Ok(Reply::empty()) })
            .jwt(AuthOptions::new().algorithm("HS256"))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "configuration error: missing secret");
    }

    #[test]
    fn no_jwt_suppresses_ambient_defaults() {
        let defaults = AuthDefaults {
            algorithm: Some("HS256".to_string()),
            secret: Some("ambient".to_string()),
            ..AuthDefaults::none()
        };
        let handler = ApiHandlerBuilder::new()
            .get(|_event, _context| async { Ok(Reply::empty()) })
            .auth_defaults(defaults)
            .no_jwt()
            .build()
            .unwrap();
        assert!(!handler.is_authenticated());
    }
}
