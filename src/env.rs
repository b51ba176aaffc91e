//! Explicit environment snapshot.
//!
//! Resolution code reads and writes an owned [`Environment`] instead of the
//! process-global variable table, so tests can build one from literal pairs
//! and inspect it afterwards. Only [`Environment::export`] and [`export_var`]
//! touch the real process environment.

use crate::mask::Masked;
use std::{collections::BTreeMap, env};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("invalid environment variable name: {0:?}")]
    InvalidKey(String),
    #[error("value for environment variable {0} contains a NUL byte")]
    InvalidValue(String),
}

/// Owned set of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment. Variables that are not valid
    /// UTF-8 are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect()
    }

    /// Value of `key` when it is set and non-empty.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    #[must_use]
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// First non-empty variable among `keys`, as `(position, name, value)`.
    #[must_use]
    pub fn first_set<'a, S: AsRef<str>>(&'a self, keys: &'a [S]) -> Option<(usize, &'a str, &'a str)> {
        keys.iter().enumerate().find_map(|(index, key)| {
            let key = key.as_ref();
            self.get(key).map(|value| (index, key, value))
        })
    }

    /// Copy `keys` from this snapshot into the process environment.
    ///
    /// Keys missing from the snapshot are skipped. Write failures are logged
    /// and never escalated; the number of exported variables is returned.
    pub fn export<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        let mut exported = 0;
        for key in keys {
            let key = key.as_ref();
            let Some(value) = self.vars.get(key) else {
                continue;
            };
            match export_var(key, value) {
                Ok(()) => {
                    debug!(variable = key, value = %Masked(value), "exported environment variable");
                    exported += 1;
                }
                Err(err) => {
                    error!(variable = key, error = %err, "failed to set environment variable");
                }
            }
        }
        exported
    }
}

impl FromIterator<(String, String)> for Environment {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Set a single process environment variable.
///
/// # Errors
/// Returns an error instead of panicking when the name is empty or contains
/// `=`/NUL, or when the value contains NUL.
pub fn export_var(key: &str, value: &str) -> Result<(), EnvError> {
    if key.is_empty() || key.contains(['=', '\0']) {
        return Err(EnvError::InvalidKey(key.to_string()));
    }
    if value.contains('\0') {
        return Err(EnvError::InvalidValue(key.to_string()));
    }
    // SAFETY: exports happen once during test setup, before worker threads read the environment.
    unsafe {
        env::set_var(key, value);
    }
    Ok(())
}
