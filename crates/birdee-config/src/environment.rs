//! Access to process environment variables behind a seam.
//!
//! Resolution reads `BIRDEE_HOME` only when `compilerPath` is empty. Tests and
//! embedding hosts supply a [`MapEnvironment`] instead of mutating the real
//! process environment.

use std::collections::HashMap;
use std::env;

/// Source of environment variables consulted during resolution.
pub trait Environment {
    /// Returns the value of `key`, or `None` when it is unset or not UTF-8.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads variables from the current process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Fixed set of variables held in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
