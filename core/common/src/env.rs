//! Process environment abstraction.
//!
//! The environment is the channel through which a session outlives a single
//! command: identity variables exported by one invocation are read back by
//! the next. Everything that reads or writes variables goes through
//! [`Environment`] so the real process environment can be swapped for
//! [`MemoryEnv`] in tests.

use std::collections::BTreeMap;

/// Read/write access to environment variables.
pub trait Environment: Send + Sync {
    /// Look up a variable. Returns `None` when unset.
    fn get(&self, name: &str) -> Option<String>;

    /// Set a variable.
    fn set(&mut self, name: &str, value: &str);

    /// Remove a variable. Removing an unset variable is a no-op.
    fn unset(&mut self, name: &str);

    /// Whether a variable is set, even to the empty string.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// The environment of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set(&mut self, name: &str, value: &str) {
        tracing::trace!(name, "setenv");
        std::env::set_var(name, value);
    }

    fn unset(&mut self, name: &str) {
        tracing::trace!(name, "unsetenv");
        std::env::remove_var(name);
    }
}

/// In-memory environment for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryEnv {
    vars: BTreeMap<String, String>,
}

impl MemoryEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// All variables currently set.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

impl Environment for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    fn unset(&mut self, name: &str) {
        self.vars.remove(name);
    }
}
