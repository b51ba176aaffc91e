use crate::{
    cli::{actions::Action, commands, dispatch},
    env::Environment,
    logging::{self, LogFormat, LoggingConfig},
};
use anyhow::Result;

/// Map verbosity count to tracing level
const fn get_verbosity_level(verbosity: u8) -> Option<tracing::Level> {
    match verbosity {
        0 => None,
        1 => Some(tracing::Level::WARN),
        2 => Some(tracing::Level::INFO),
        3 => Some(tracing::Level::DEBUG),
        _ => Some(tracing::Level::TRACE),
    }
}

/// Parse arguments, install logging and return the action to run.
///
/// # Errors
/// Returns an error if logging cannot be initialized or dispatch fails.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity_level = get_verbosity_level(
        matches
            .get_one::<u8>(commands::logging::ARG_VERBOSITY)
            .copied()
            .unwrap_or(0),
    );

    let env = Environment::from_process();
    let mut config = LoggingConfig::from_env(&env, verbosity_level);
    if let Some(format) = matches
        .get_one::<LogFormat>(commands::logging::ARG_LOG_FORMAT)
        .copied()
    {
        config = config.with_format(format);
    }
    logging::init(&config)?;

    let action = dispatch::handler(&matches)?;

    Ok(action)
}
