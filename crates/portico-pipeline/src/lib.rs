//! # Portico Pipeline
//!
//! Generic ordered-stage execution engine.
//!
//! A [`PipelineDefinition`] is an immutable ordered list of named stages
//! fixed at construction. Each name maps to a handler, initially a no-op;
//! handlers are registered with [`PipelineDefinition::on`] and mutate a
//! shared, invocation-scoped state record. The engine owns no domain
//! knowledge: what the state is and what the stages do is entirely up to
//! the caller.
//!
//! Stages execute strictly in declared order. A handler returns a
//! [`StageFlow`], an explicit tag for "completed synchronously" vs.
//! "deferred"; the engine awaits deferred results uniformly, so correctness
//! never depends on whether a given stage suspends. The first failure
//! short-circuits all later stages.

#![doc(html_root_url = "https://docs.rs/portico-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod definition;
mod flow;
mod hooks;
mod report;

pub use definition::{DefinitionError, PipelineDefinition};
pub use flow::{BoxFuture, StageFlow, StageFn};
pub use hooks::StageHooks;
pub use report::{RunError, RunReport};
