//! Environment variable lookup.
//!
//! Everything that reads the environment goes through [`EnvLookup`] so tests
//! can pass a `HashMap` instead of mutating the process environment.

use std::collections::HashMap;

/// Source of environment variable values.
pub trait EnvLookup: Send + Sync {
    /// Value of `name`, or `None` if it is unset. Set-but-empty is `Some("")`.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<T: EnvLookup + ?Sized> EnvLookup for std::sync::Arc<T> {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}
