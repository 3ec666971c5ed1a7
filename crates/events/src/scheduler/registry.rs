use std::collections::HashMap;
use std::sync::Arc;

use super::item::{Command, Payload};

/// Produces a fresh payload for a tagged command.
pub type Callback = Arc<dyn Fn(&Command) -> Payload + Send + Sync>;

/// Named callbacks, looked up when a [`Command`] is dispatched.
///
/// Last write wins on re-registration. Removing a missing name is a no-op.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Callback>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`, replacing any previous entry.
    /// Returns `true` when an entry was replaced.
    pub fn register(&mut self, name: impl Into<String>, callback: Callback) -> bool {
        self.callbacks.insert(name.into(), callback).is_some()
    }

    /// Returns `true` when an entry was removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        self.callbacks.remove(name).is_some()
    }

    pub fn lookup(&self, name: &str) -> Option<Callback> {
        self.callbacks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.callbacks.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
