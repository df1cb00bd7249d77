//! Pipeline definition and execution.

use crate::flow::{StageFlow, StageFn};
use crate::hooks::StageHooks;
use crate::report::{RunError, RunReport};
use thiserror::Error;

/// Error raised while registering stage handlers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    /// The named stage is not part of this pipeline's declared order.
    #[error("unknown pipeline stage: {0}")]
    UnknownStage(String),
}

struct StageSlot<S, E> {
    name: &'static str,
    handler: Option<StageFn<S, E>>,
}

/// An immutable ordered list of named stages with registered handlers.
///
/// The stage order is fixed when the definition is created; handlers are
/// attached afterwards by name. A stage with no handler is a no-op.
/// Registering twice for the same name replaces the previous handler
/// (last write wins); registering for an unknown name fails.
///
/// # Example
///
/// ```
/// use portico_pipeline::{PipelineDefinition, StageFlow};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("boom")]
/// struct Boom;
///
/// # tokio_test::block_on(async {
/// let mut pipeline: PipelineDefinition<Vec<&str>, Boom> =
///     PipelineDefinition::new(["first", "second"]);
///
/// pipeline
///     .on("first", |log| {
///         log.push("first ran");
///         StageFlow::done()
///     })
///     .unwrap();
///
/// let mut log = Vec::new();
/// let report = pipeline.run(&mut log).await;
/// assert!(report.is_ok());
/// assert!(report.was_stage_run("first"));
/// assert!(report.was_stage_run("second")); // no-op stages still count
/// assert_eq!(log, vec!["first ran"]);
/// # });
/// ```
pub struct PipelineDefinition<S, E> {
    stages: Vec<StageSlot<S, E>>,
}

impl<S, E> PipelineDefinition<S, E>
where
    E: std::error::Error + 'static,
{
    /// Creates a definition with the given stage names, in order.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            stages: names
                .into_iter()
                .map(|name| StageSlot {
                    name,
                    handler: None,
                })
                .collect(),
        }
    }

    /// Registers a handler for a declared stage name.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::UnknownStage`] when the name is not part
    /// of the declared order.
    pub fn on<F>(&mut self, name: &str, handler: F) -> Result<(), DefinitionError>
    where
        F: for<'a> Fn(&'a mut S) -> StageFlow<'a, E> + Send + Sync + 'static,
    {
        let slot = self
            .stages
            .iter_mut()
            .find(|slot| slot.name == name)
            .ok_or_else(|| DefinitionError::UnknownStage(name.to_string()))?;
        slot.handler = Some(Box::new(handler));
        Ok(())
    }

    /// Returns the declared stage names, in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|slot| slot.name).collect()
    }

    /// Returns the number of declared stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Runs every stage in declared order, awaiting deferred results.
    pub async fn run(&self, state: &mut S) -> RunReport<E> {
        self.execute(state, None, false).await
    }

    /// Runs the pipeline in synchronous-first mode.
    ///
    /// Ordering and short-circuit semantics are identical to [`run`](Self::run);
    /// the only difference is that a stage returning a deferred result is a
    /// pipeline error. The overall result is still delivered asynchronously.
    pub async fn run_eager(&self, state: &mut S) -> RunReport<E> {
        self.execute(state, None, true).await
    }

    /// Runs the pipeline with a test-instrumentation hook set.
    ///
    /// Production traffic never passes hooks; this entry point exists so
    /// tests can observe or replace individual stages.
    pub async fn run_with_hooks(&self, state: &mut S, hooks: &StageHooks<S, E>) -> RunReport<E> {
        self.execute(state, Some(hooks), false).await
    }

    async fn execute(
        &self,
        state: &mut S,
        hooks: Option<&StageHooks<S, E>>,
        eager: bool,
    ) -> RunReport<E> {
        let mut completed = Vec::with_capacity(self.stages.len());

        for slot in &self.stages {
            if let Some(hook) = hooks.and_then(|hooks| hooks.before_of(slot.name)) {
                if let Err(error) = hook(state).resolve().await {
                    return RunReport::new(
                        completed,
                        Err(RunError::Stage {
                            stage: slot.name,
                            source: error,
                        }),
                    );
                }
            }

            let result = {
                let flow = match hooks.and_then(|hooks| hooks.replacement_of(slot.name)) {
                    Some(replacement) => replacement(state),
                    None => match &slot.handler {
                        Some(handler) => handler(state),
                        None => StageFlow::done(),
                    },
                };

                match flow {
                    StageFlow::Ready(result) => result,
                    StageFlow::Deferred(future) => {
                        if eager {
                            return RunReport::new(
                                completed,
                                Err(RunError::DeferredNotAllowed { stage: slot.name }),
                            );
                        }
                        future.await
                    }
                }
            };

            if let Err(error) = result {
                tracing::debug!(stage = slot.name, error = %error, "pipeline stage failed");
                return RunReport::new(
                    completed,
                    Err(RunError::Stage {
                        stage: slot.name,
                        source: error,
                    }),
                );
            }

            if let Some(hook) = hooks.and_then(|hooks| hooks.after_of(slot.name)) {
                if let Err(error) = hook(state).resolve().await {
                    return RunReport::new(
                        completed,
                        Err(RunError::Stage {
                            stage: slot.name,
                            source: error,
                        }),
                    );
                }
            }

            completed.push(slot.name);
        }

        RunReport::new(completed, Ok(()))
    }
}
