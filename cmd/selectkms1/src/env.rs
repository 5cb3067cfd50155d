use std::collections::HashMap;

use crate::error::Error;

/// Source of configuration variables.
pub trait Environment: Send + Sync {
    /// Value of `key`, `None` when unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Reads `key`. Unset and empty are the same; a required variable that is either fails with
/// [`Error::MissingVariable`], an optional one yields an empty string.
pub fn lookup(env: &dyn Environment, key: &'static str, required: bool) -> Result<String, Error> {
    match env.var(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ if required => Err(Error::MissingVariable(key)),
        _ => Ok(String::new()),
    }
}
