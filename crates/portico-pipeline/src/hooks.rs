//! Test instrumentation hooks.
//!
//! A [`StageHooks`] set carries optional `{before, replacement, after}`
//! handlers per stage name and is passed to
//! [`PipelineDefinition::run_with_hooks`](crate::PipelineDefinition::run_with_hooks).
//! Hooks exist only for test instrumentation; production entry points run
//! without them, and their absence is the default.

use crate::flow::{StageFlow, StageFn};
use std::collections::HashMap;

pub(crate) struct StageHook<S, E> {
    pub(crate) before: Option<StageFn<S, E>>,
    pub(crate) replacement: Option<StageFn<S, E>>,
    pub(crate) after: Option<StageFn<S, E>>,
}

impl<S, E> StageHook<S, E> {
    fn empty() -> Self {
        Self {
            before: None,
            replacement: None,
            after: None,
        }
    }
}

/// Per-stage instrumentation handlers, keyed by stage name.
pub struct StageHooks<S, E> {
    entries: HashMap<&'static str, StageHook<S, E>>,
}

impl<S, E> StageHooks<S, E> {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers a handler to run before the named stage.
    #[must_use]
    pub fn before<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut S) -> StageFlow<'a, E> + Send + Sync + 'static,
    {
        self.entry(name).before = Some(Box::new(hook));
        self
    }

    /// Registers a handler that replaces the named stage's own handler.
    #[must_use]
    pub fn replacement<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut S) -> StageFlow<'a, E> + Send + Sync + 'static,
    {
        self.entry(name).replacement = Some(Box::new(hook));
        self
    }

    /// Registers a handler to run after the named stage.
    #[must_use]
    pub fn after<F>(mut self, name: &'static str, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut S) -> StageFlow<'a, E> + Send + Sync + 'static,
    {
        self.entry(name).after = Some(Box::new(hook));
        self
    }

    fn entry(&mut self, name: &'static str) -> &mut StageHook<S, E> {
        self.entries.entry(name).or_insert_with(StageHook::empty)
    }

    pub(crate) fn before_of(&self, name: &str) -> Option<&StageFn<S, E>> {
        self.entries.get(name).and_then(|hook| hook.before.as_ref())
    }

    pub(crate) fn replacement_of(&self, name: &str) -> Option<&StageFn<S, E>> {
        self.entries
            .get(name)
            .and_then(|hook| hook.replacement.as_ref())
    }

    pub(crate) fn after_of(&self, name: &str) -> Option<&StageFn<S, E>> {
        self.entries.get(name).and_then(|hook| hook.after.as_ref())
    }
}

impl<S, E> Default for StageHooks<S, E> {
    fn default() -> Self {
        Self::new()
    }
}
