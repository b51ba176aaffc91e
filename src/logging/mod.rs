//! Logging setup.
//!
//! `init` installs the global `tracing` subscriber: an `EnvFilter` (so
//! `RUST_LOG` still wins) and an fmt layer on stderr, JSON in CI and pretty
//! locally. Stdout is left to command output.
//! [`capture`] holds the in-memory counterpart used by tests.

pub mod capture;

use crate::{
    ci::{self, CiMetadata},
    dsn::env_with_fallbacks,
    env::Environment,
};
use anyhow::Result;
use std::io;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const SCRY_LOG_LEVEL: &str = "SCRY_LOG_LEVEL";
pub const LOG_FORMAT: &str = "LOG_FORMAT";

pub const DEFAULT_LEVEL: Level = Level::INFO;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "text" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// `LOG_FORMAT` when valid, otherwise JSON in CI and pretty elsewhere.
    #[must_use]
    pub fn detect(env: &Environment) -> Self {
        env.get(LOG_FORMAT)
            .and_then(Self::parse)
            .unwrap_or_else(|| if ci::is_ci(env) { Self::Json } else { Self::Pretty })
    }
}

/// Parse a level name (`debug`, `info`, `warn`, `error`, `trace`), case-insensitive.
#[must_use]
pub fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    pub ci: CiMetadata,
    /// Configured level that failed to parse; reported once logging is up.
    pub rejected_level: Option<String>,
}

impl LoggingConfig {
    #[must_use]
    pub fn new(level: Level, format: LogFormat) -> Self {
        Self {
            level,
            format,
            ci: CiMetadata::default(),
            rejected_level: None,
        }
    }

    /// Build from the environment. An explicit `verbosity` overrides
    /// `SCRY_LOG_LEVEL`/`LOG_LEVEL`; an unparsable level falls back to info.
    #[must_use]
    pub fn from_env(env: &Environment, verbosity: Option<Level>) -> Self {
        let mut config = Self::new(DEFAULT_LEVEL, LogFormat::detect(env));
        config.ci = CiMetadata::collect(env);

        if let Some(level) = verbosity {
            config.level = level;
            return config;
        }

        let configured = env_with_fallbacks(env, &[SCRY_LOG_LEVEL, LOG_LEVEL], "info");
        match parse_level(&configured) {
            Some(level) => config.level = level,
            None => config.rejected_level = Some(configured),
        }
        config
    }

    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
/// Returns an error if a filter directive is invalid or a global subscriber
/// is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy()
        .add_directive("sqlx=warn".parse()?);

    match config.format {
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_current_span(false)
                .with_target(false)
                .with_writer(io::stderr);
            let subscriber = Registry::default().with(fmt_layer).with(filter);
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_target(false)
                .with_writer(io::stderr)
                .pretty();
            let subscriber = Registry::default().with(fmt_layer).with(filter);
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    if let Some(rejected) = &config.rejected_level {
        warn!(
            configured_level = %rejected,
            default_level = "info",
            "invalid log level configured, using default level"
        );
    }

    if let Some(provider) = config.ci.provider {
        info!(
            ci_provider = %provider,
            ci_run_id = config.ci.run_id.as_deref().unwrap_or(""),
            ci_commit = config.ci.commit.as_deref().unwrap_or(""),
            ci_branch = config.ci.branch.as_deref().unwrap_or(""),
            "CI environment detected"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels_case_insensitively() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level(" warn "), Some(Level::WARN));
        assert_eq!(parse_level("error"), Some(Level::ERROR));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn format_follows_ci() {
        assert_eq!(LogFormat::detect(&Environment::new()), LogFormat::Pretty);
        assert_eq!(
            LogFormat::detect(&Environment::from_pairs([("CI", "true")])),
            LogFormat::Json
        );
        assert_eq!(
            LogFormat::detect(&Environment::from_pairs([("CI", "true"), ("LOG_FORMAT", "pretty")])),
            LogFormat::Pretty
        );
    }

    #[test]
    fn invalid_level_falls_back_to_info() {
        let env = Environment::from_pairs([("LOG_LEVEL", "loud")]);
        let config = LoggingConfig::from_env(&env, None);
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.rejected_level.as_deref(), Some("loud"));
    }

    #[test]
    fn scry_log_level_takes_precedence() {
        let env = Environment::from_pairs([("LOG_LEVEL", "error"), ("SCRY_LOG_LEVEL", "debug")]);
        assert_eq!(LoggingConfig::from_env(&env, None).level, Level::DEBUG);
    }

    #[test]
    fn explicit_verbosity_wins() {
        let env = Environment::from_pairs([("LOG_LEVEL", "error"), ("GITLAB_CI", "true")]);
        let config = LoggingConfig::from_env(&env, Some(Level::TRACE));
        assert_eq!(config.level, Level::TRACE);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.ci.is_ci());
    }
}
