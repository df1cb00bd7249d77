//! Pipeline run reports.

use thiserror::Error;

/// Failure of a pipeline run.
#[derive(Debug, Error)]
pub enum RunError<E>
where
    E: std::error::Error + 'static,
{
    /// A stage handler returned an error; later stages did not run.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        /// Name of the failed stage.
        stage: &'static str,
        /// The stage's error.
        #[source]
        source: E,
    },

    /// A stage returned a deferred result while the pipeline was running in
    /// synchronous-first mode.
    #[error("stage '{stage}' returned a deferred result in synchronous mode")]
    DeferredNotAllowed {
        /// Name of the offending stage.
        stage: &'static str,
    },
}

impl<E> RunError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the domain error of a failed stage, if there is one.
    #[must_use]
    pub fn stage_error(&self) -> Option<&E> {
        match self {
            Self::Stage { source, .. } => Some(source),
            Self::DeferredNotAllowed { .. } => None,
        }
    }

    /// Consumes the error, returning the stage's domain error if present.
    #[must_use]
    pub fn into_stage_error(self) -> Option<E> {
        match self {
            Self::Stage { source, .. } => Some(source),
            Self::DeferredNotAllowed { .. } => None,
        }
    }
}

/// The outcome of one pipeline run: the result plus which stages completed.
///
/// [`was_stage_run`](Self::was_stage_run) exists for diagnostics and tests;
/// a stage counts as run only when its handler (and any test hooks around
/// it) completed without error.
#[derive(Debug)]
pub struct RunReport<E>
where
    E: std::error::Error + 'static,
{
    completed: Vec<&'static str>,
    result: Result<(), RunError<E>>,
}

impl<E> RunReport<E>
where
    E: std::error::Error + 'static,
{
    pub(crate) fn new(completed: Vec<&'static str>, result: Result<(), RunError<E>>) -> Self {
        Self { completed, result }
    }

    /// Whether the named stage completed.
    #[must_use]
    pub fn was_stage_run(&self, name: &str) -> bool {
        self.completed.iter().any(|stage| *stage == name)
    }

    /// The names of every completed stage, in execution order.
    #[must_use]
    pub fn completed_stages(&self) -> &[&'static str] {
        &self.completed
    }

    /// Whether the run completed without error.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Borrows the run result.
    #[must_use]
    pub fn result(&self) -> Result<(), &RunError<E>> {
        match &self.result {
            Ok(()) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Consumes the report, yielding the run result.
    pub fn into_result(self) -> Result<(), RunError<E>> {
        self.result
    }
}
