//! Stage handler result type.
//!
//! A stage either completes synchronously or hands back a future. The
//! distinction is an explicit tag, not structural inspection of the return
//! value, so the engine can branch on it without guessing.

use std::future::Future;
use std::pin::Pin;

/// A boxed future, as produced by deferred stage handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed stage handler over state `S` and error `E`.
///
/// The handler borrows the state mutably; a deferred result may keep that
/// borrow alive until the engine awaits it.
pub type StageFn<S, E> = Box<dyn for<'a> Fn(&'a mut S) -> StageFlow<'a, E> + Send + Sync>;

/// The outcome of invoking a stage handler.
pub enum StageFlow<'a, E> {
    /// The stage completed (or failed) synchronously.
    Ready(Result<(), E>),
    /// The stage is still running; the engine awaits the future.
    Deferred(BoxFuture<'a, Result<(), E>>),
}

impl<'a, E> StageFlow<'a, E> {
    /// A stage that completed successfully.
    #[must_use]
    pub fn done() -> Self {
        Self::Ready(Ok(()))
    }

    /// A stage that failed synchronously.
    #[must_use]
    pub fn fail(error: E) -> Self {
        Self::Ready(Err(error))
    }

    /// A stage that suspends; the engine awaits the future before advancing.
    #[must_use]
    pub fn defer(future: impl Future<Output = Result<(), E>> + Send + 'a) -> Self {
        Self::Deferred(Box::pin(future))
    }

    /// Whether this outcome is deferred.
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    /// Resolves the outcome, awaiting a deferred result.
    pub async fn resolve(self) -> Result<(), E> {
        match self {
            Self::Ready(result) => result,
            Self::Deferred(future) => future.await,
        }
    }
}

impl<'a, E> From<Result<(), E>> for StageFlow<'a, E> {
    fn from(result: Result<(), E>) -> Self {
        Self::Ready(result)
    }
}
