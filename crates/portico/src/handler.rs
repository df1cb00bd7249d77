//! Invocation handling.
//!
//! [`ApiHandler`] drives a fixed-order stage pipeline over every inbound
//! event and always produces a response envelope; a failure anywhere in the
//! pipeline or in business code is formatted, never propagated to the
//! hosting runtime.

use crate::protection::Protection;
use crate::registry::{Executor, MethodHandler, MethodRegistry};
use crate::reply::Reply;
use crate::response::{assemble_error, assemble_success};
use indexmap::IndexMap;
use portico_auth::AuthValidator;
use portico_core::{
    FunctionContext, HeaderValue, PorticoError, PorticoResult, ProxyEvent, ResponseEnvelope,
};
use portico_extract::{decode_body, normalize, parse_cookie_header, BodyDecodePolicy};
use portico_pipeline::{BoxFuture, DefinitionError, PipelineDefinition, RunError, StageFlow};
use std::sync::Arc;

/// The global error hook: may replace the failure before it is formatted.
pub type ErrorHook = Arc<
    dyn Fn(PorticoError, ProxyEvent, FunctionContext) -> BoxFuture<'static, PorticoError>
        + Send
        + Sync,
>;

/// The per-invocation cleanup hook.
pub type FinallyHook = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// The request pipeline's stage names, in execution order.
pub const STAGES: [&str; 8] = [
    "method",
    "normalize",
    "body",
    "protection",
    "cookies",
    "authentication",
    "validation",
    "executor",
];

pub(crate) struct ExecutionState {
    pub(crate) event: ProxyEvent,
    pub(crate) context: FunctionContext,
    pub(crate) binding: Option<Arc<MethodHandler>>,
    pub(crate) executor: Option<Executor>,
}

pub(crate) struct HandlerConfig {
    pub(crate) registry: MethodRegistry,
    pub(crate) auth: AuthValidator,
    pub(crate) body_policy: BodyDecodePolicy,
    pub(crate) protection: Protection,
    pub(crate) default_headers: IndexMap<String, HeaderValue>,
    pub(crate) on_error: Option<ErrorHook>,
    pub(crate) finally: Option<FinallyHook>,
}

/// A compiled request handler.
///
/// Immutable after construction; one instance serves every warm invocation.
/// [`handle`](Self::handle) never fails: every outcome, including pipeline
/// and configuration failures, becomes a [`ResponseEnvelope`].
pub struct ApiHandler {
    pipeline: PipelineDefinition<ExecutionState, PorticoError>,
    registry: Arc<MethodRegistry>,
    authenticated: bool,
    default_headers: IndexMap<String, HeaderValue>,
    on_error: Option<ErrorHook>,
    finally: Option<FinallyHook>,
}

fn definition_error(error: DefinitionError) -> PorticoError {
    PorticoError::configuration(error.to_string())
}

impl std::fmt::Debug for ApiHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiHandler").finish_non_exhaustive()
    }
}

impl ApiHandler {
    /// Starts a new [`crate::ApiHandlerBuilder`].
    #[must_use]
    pub fn builder() -> crate::ApiHandlerBuilder {
        crate::ApiHandlerBuilder::new()
    }

    pub(crate) fn assemble(config: HandlerConfig) -> PorticoResult<Self> {
        let registry = Arc::new(config.registry);
        let auth = Arc::new(config.auth);
        let protection = Arc::new(config.protection);
        let authenticated = auth.is_enabled();
        let body_policy = config.body_policy;

        let mut pipeline = PipelineDefinition::new(STAGES);

        let routing = Arc::clone(&registry);
        pipeline
            .on("method", move |state: &mut ExecutionState| {
                let method = state.event.http_method.trim().to_ascii_uppercase();
                match routing.lookup(&method) {
                    Some(binding) => {
                        state.event.http_method = method;
                        state.binding = Some(binding);
                        StageFlow::done()
                    }
                    None => StageFlow::fail(PorticoError::routing(method)),
                }
            })
            .map_err(definition_error)?;

        pipeline
            .on("normalize", |state: &mut ExecutionState| {
                normalize(&mut state.event);
                StageFlow::done()
            })
            .map_err(definition_error)?;

        pipeline
            .on("body", move |state: &mut ExecutionState| {
                decode_body(&mut state.event, body_policy);
                StageFlow::done()
            })
            .map_err(definition_error)?;

        pipeline
            .on("protection", move |state: &mut ExecutionState| {
                protection.run(&state.event).into()
            })
            .map_err(definition_error)?;

        pipeline
            .on("cookies", |state: &mut ExecutionState| {
                if let Some(header) = state.event.header("cookie").map(String::from) {
                    state.event.cookies = parse_cookie_header(&header);
                }
                StageFlow::done()
            })
            .map_err(definition_error)?;

        pipeline
            .on("authentication", move |state: &mut ExecutionState| {
                auth.validate(&mut state.event).into()
            })
            .map_err(definition_error)?;

        pipeline
            .on("validation", |state: &mut ExecutionState| {
                let sections = state
                    .binding
                    .as_ref()
                    .and_then(|binding| binding.sections.clone());
                match sections {
                    Some(sections) => sections.validate(&mut state.event).into(),
                    None => StageFlow::done(),
                }
            })
            .map_err(definition_error)?;

        pipeline
            .on("executor", |state: &mut ExecutionState| {
                match state.binding.as_ref().map(|binding| binding.executor.clone()) {
                    Some(executor) => {
                        state.executor = Some(executor);
                        StageFlow::done()
                    }
                    None => StageFlow::fail(PorticoError::configuration("no executor resolved")),
                }
            })
            .map_err(definition_error)?;

        Ok(Self {
            pipeline,
            registry,
            authenticated,
            default_headers: config.default_headers,
            on_error: config.on_error,
            finally: config.finally,
        })
    }

    /// The registered method names.
    #[must_use]
    pub fn methods(&self) -> Vec<&str> {
        self.registry.methods()
    }

    /// Whether token authentication is enabled.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Handles one invocation and always produces an envelope.
    ///
    /// The cleanup hook, when registered, runs exactly once after the
    /// envelope is assembled; its failures are logged and swallowed.
    pub async fn handle(&self, event: ProxyEvent, context: FunctionContext) -> ResponseEnvelope {
        let envelope = self.execute(event, context).await;
        if let Some(finally) = &self.finally {
            if let Err(error) = finally().await {
                tracing::warn!(error = %error, "cleanup hook failed");
            }
        }
        envelope
    }

    async fn execute(&self, event: ProxyEvent, context: FunctionContext) -> ResponseEnvelope {
        let mut state = ExecutionState {
            event,
            context,
            binding: None,
            executor: None,
        };

        let report = self.pipeline.run(&mut state).await;
        let outcome: PorticoResult<Reply> = match report.into_result() {
            Ok(()) => match state.executor.clone() {
                Some(executor) => executor(state.event.clone(), state.context.clone()).await,
                None => Err(PorticoError::configuration("no executor resolved")),
            },
            Err(RunError::Stage { source, .. }) => Err(source),
            Err(RunError::DeferredNotAllowed { stage }) => Err(PorticoError::configuration(
                format!("stage deferred unexpectedly: {stage}"),
            )),
        };

        let method_headers = state
            .binding
            .as_deref()
            .map(|binding| binding.headers.clone());
        let envelope = match outcome {
            Ok(reply) => {
                tracing::debug!(method = %state.event.http_method, "request handled");
                assemble_success(
                    reply,
                    &state.event.http_method,
                    &self.default_headers,
                    method_headers.as_ref(),
                )
            }
            Err(error) => {
                let error = match &self.on_error {
                    Some(hook) => hook(error, state.event.clone(), state.context.clone()).await,
                    None => error,
                };
                tracing::debug!(
                    method = %state.event.http_method,
                    error = %error,
                    "request failed"
                );
                assemble_error(&error, &self.default_headers, method_headers.as_ref())
            }
        };

        let Some(hook) = state
            .binding
            .as_ref()
            .and_then(|binding| binding.on_response.clone())
        else {
            return envelope;
        };
        match hook(envelope.clone()).await {
            Ok(replaced) => replaced,
            Err(error) => {
                tracing::error!(error = %error, "response hook failed; returning original envelope");
                envelope
            }
        }
    }
}
