//! Database URL resolution.
//!
//! A [`Resolver`] watches an ordered list of environment variables. The first
//! non-empty one wins; under CI its value is standardized (see
//! [`standardize()`]) and every other watched variable that was set is
//! rewritten to the same value, so later readers agree regardless of which
//! name they consult.
//!
//! Resolution never fails. A malformed URL is logged and handed back as-is,
//! and the [`Outcome`] records what happened for callers that care.

mod standardize;

pub use standardize::{CiDefaults, CredentialPolicy, DsnError, is_postgres_scheme, standardize};

use crate::{ci, env::Environment, mask::Masked};
use tracing::{debug, error, info, warn};

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const SCRY_TEST_DB_URL: &str = "SCRY_TEST_DB_URL";
pub const SCRY_DATABASE_URL: &str = "SCRY_DATABASE_URL";

/// Watched variables, highest priority first.
pub const CANDIDATES: [&str; 3] = [DATABASE_URL, SCRY_TEST_DB_URL, SCRY_DATABASE_URL];

/// The standardized name; using any other candidate logs a warning.
pub const PREFERRED: &str = SCRY_TEST_DB_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiMode {
    Local,
    Ci(CredentialPolicy),
}

impl CiMode {
    /// Hosted GitHub Actions runners force both credentials; any other CI
    /// keeps the password.
    #[must_use]
    pub fn detect(env: &Environment) -> Self {
        if ci::is_github_actions(env) {
            Self::Ci(CredentialPolicy::ForceBoth)
        } else if ci::is_ci(env) {
            Self::Ci(CredentialPolicy::PreservePassword)
        } else {
            Self::Local
        }
    }

    #[must_use]
    pub const fn is_ci(self) -> bool {
        matches!(self, Self::Ci(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No candidate variable was set.
    Unset,
    /// The winning value is returned as found.
    Unchanged,
    /// The winning value was rewritten for CI.
    Standardized,
    /// Standardization failed; the original value is returned.
    Fallback(DsnError),
}

/// Result of one resolver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    source: Option<String>,
    original: String,
    url: String,
    outcome: Outcome,
    updates: Vec<(String, String)>,
}

impl Resolution {
    fn unset() -> Self {
        Self {
            source: None,
            original: String::new(),
            url: String::new(),
            outcome: Outcome::Unset,
            updates: Vec::new(),
        }
    }

    /// The resolved URL, or `""` when nothing was set.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn into_url(self) -> String {
        self.url
    }

    /// Variable the value came from.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[must_use]
    pub const fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.url.is_empty()
    }

    /// Variables to rewrite so every watched name observes [`Self::url`].
    #[must_use]
    pub fn updates(&self) -> &[(String, String)] {
        &self.updates
    }

    /// Apply [`Self::updates`] to `env`.
    pub fn write_back(&self, env: &mut Environment) {
        for (variable, value) in &self.updates {
            debug!(variable = %variable, value = %Masked(value), "updating environment variable");
            env.set(variable.clone(), value.clone());
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    candidates: Vec<String>,
    defaults: CiDefaults,
}

impl Resolver {
    #[must_use]
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            defaults: CiDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: CiDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    #[must_use]
    pub const fn defaults(&self) -> &CiDefaults {
        &self.defaults
    }

    /// Resolve against `env` in the given mode without modifying anything.
    #[must_use]
    pub fn resolve(&self, env: &Environment, mode: CiMode) -> Resolution {
        if mode.is_ci() {
            for candidate in &self.candidates {
                let value = env
                    .get(candidate)
                    .map_or_else(|| "<not set>".to_string(), |v| Masked(v).to_string());
                debug!(variable = %candidate, value = %value, "checking database URL variable");
            }
        }

        let Some((_, source, value)) = env.first_set(self.candidates.as_slice()) else {
            if mode.is_ci() {
                error!(
                    checked = %self.candidates.join(", "),
                    "no database URL found in CI environment, set at least one database URL variable"
                );
            } else {
                info!("no database URL environment variables found");
            }
            return Resolution::unset();
        };

        let preferred_watched = self.candidates.iter().any(|candidate| candidate == PREFERRED);
        if source == PREFERRED || !preferred_watched {
            info!(variable = source, url = %Masked(value), "using database URL from environment variable");
        } else {
            warn!(
                used = source,
                preferred = PREFERRED,
                url = %Masked(value),
                "using non-standardized database URL environment variable"
            );
        }

        let mut resolution = Resolution {
            source: Some(source.to_string()),
            original: value.to_string(),
            url: value.to_string(),
            outcome: Outcome::Unchanged,
            updates: Vec::new(),
        };

        let CiMode::Ci(policy) = mode else {
            return resolution;
        };

        match standardize(value, policy, &self.defaults) {
            Ok(url) if url == value => {}
            Ok(url) => {
                info!(
                    original = %Masked(value),
                    standardized = %Masked(&url),
                    "standardized database URL for CI environment"
                );
                resolution.updates = self
                    .candidates
                    .iter()
                    .filter_map(|candidate| {
                        env.get(candidate)
                            .filter(|current| *current != url)
                            .map(|_| (candidate.clone(), url.clone()))
                    })
                    .collect();
                resolution.url = url;
                resolution.outcome = Outcome::Standardized;
            }
            Err(err) => {
                error!(error = %err, url = %Masked(value), "failed to standardize database URL");
                resolution.outcome = Outcome::Fallback(err);
            }
        }

        resolution
    }

    /// Detect the CI mode from `env`, resolve, and write the result back.
    pub fn resolve_in(&self, env: &mut Environment) -> Resolution {
        let resolution = self.resolve(env, CiMode::detect(env));
        resolution.write_back(env);
        resolution
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(CANDIDATES)
    }
}

/// Resolve the test database URL from the process environment.
///
/// Standardized values are exported back into the process so code that
/// reads the variables directly sees the same URL. Returns `""` when no
/// candidate is set.
#[must_use]
pub fn test_database_url() -> String {
    let mut env = Environment::from_process();
    let resolution = Resolver::default().resolve_in(&mut env);
    let updated: Vec<&str> = resolution
        .updates()
        .iter()
        .map(|(variable, _)| variable.as_str())
        .collect();
    env.export(updated.as_slice());
    resolution.into_url()
}

/// First non-empty variable among `names`, else `default`.
///
/// Falling through to anything but the first name logs a warning.
#[must_use]
pub fn env_with_fallbacks(env: &Environment, names: &[&str], default: &str) -> String {
    match env.first_set(names) {
        Some((index, used, value)) => {
            if index > 0 {
                warn!(
                    used,
                    preferred = names[0],
                    value = %Masked(value),
                    "using legacy environment variable"
                );
            }
            value.to_string()
        }
        None => default.to_string(),
    }
}
