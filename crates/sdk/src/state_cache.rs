//! Latest world-state snapshot plus its update listeners.
//!
//! The cache holds one snapshot at a time. Each arriving snapshot replaces
//! the previous one wholesale and is then handed to listeners in arrival
//! order, on the receive task.

use std::sync::{Arc, PoisonError, RwLock};

use regex_lite::{Regex, RegexBuilder};
use rsbot_protocol::WorldState;

use crate::listeners::{ListenerRegistry, Subscription};

/// Name matcher for the `find_*` accessors.
///
/// Text is compiled as a case-insensitive regular expression. Text that does
/// not compile matches nothing. A prebuilt [`Regex`] is used as-is.
#[derive(Debug, Clone)]
pub struct Pattern(Option<Regex>);

impl Pattern {
    pub fn new(text: &str) -> Self {
        let regex = RegexBuilder::new(text).case_insensitive(true).build();
        if let Err(err) = &regex {
            tracing::debug!(pattern = text, error = %err, "Invalid name pattern");
        }
        Self(regex.ok())
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.as_ref().is_some_and(|regex| regex.is_match(name))
    }
}

impl From<&str> for Pattern {
    fn from(text: &str) -> Self {
        Pattern::new(text)
    }
}

impl From<&String> for Pattern {
    fn from(text: &String) -> Self {
        Pattern::new(text)
    }
}

impl From<String> for Pattern {
    fn from(text: String) -> Self {
        Pattern::new(&text)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern(Some(regex))
    }
}

impl From<&Regex> for Pattern {
    fn from(regex: &Regex) -> Self {
        Pattern(Some(regex.clone()))
    }
}

pub(crate) struct StateCache {
    current: RwLock<Option<Arc<WorldState>>>,
    listeners: Arc<ListenerRegistry<Arc<WorldState>>>,
}

impl StateCache {
    pub(crate) fn new() -> Self {
        Self {
            current: RwLock::new(None),
            listeners: ListenerRegistry::new("state"),
        }
    }

    pub(crate) fn snapshot(&self) -> Option<Arc<WorldState>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the snapshot, then notify listeners.
    pub(crate) fn replace(&self, state: Arc<WorldState>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&state));
        self.listeners.emit(&state);
    }

    pub(crate) fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Arc<WorldState>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
