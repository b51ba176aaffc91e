use crate::logging::LogFormat;
use clap::{Arg, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_FORMAT: &str = "log-format";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn validator_log_format() -> ValueParser {
    ValueParser::from(move |format: &str| -> std::result::Result<LogFormat, String> {
        LogFormat::parse(format).ok_or_else(|| "invalid log format, expected json or pretty".to_string())
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: LOG_LEVEL or INFO)")
                .env("SCRY_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_FORMAT)
                .long("log-format")
                .help("Log output format (default: json in CI, pretty elsewhere)")
                .env("LOG_FORMAT")
                .global(true)
                .value_parser(validator_log_format()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_names_map_to_counts() {
        let command = with_args(Command::new("test"));
        for (name, expected) in [("error", 0u8), ("WARN", 1), ("info", 2), ("debug", 3), ("trace", 4), ("5", 5)] {
            temp_env::with_var("SCRY_LOG_LEVEL", Some(name), || {
                let matches = command.clone().get_matches_from(vec!["test"]);
                assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(expected), "{name}");
            });
        }
    }

    #[test]
    fn rejects_unknown_log_level() {
        temp_env::with_var("SCRY_LOG_LEVEL", Some("loud"), || {
            let result = with_args(Command::new("test")).try_get_matches_from(vec!["test"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn log_format_env_accepts_aliases() {
        let command = with_args(Command::new("test"));
        for (value, expected) in [("JSON", LogFormat::Json), ("text", LogFormat::Pretty), ("pretty", LogFormat::Pretty)] {
            temp_env::with_vars([("LOG_FORMAT", Some(value)), ("SCRY_LOG_LEVEL", None)], || {
                let matches = command.clone().get_matches_from(vec!["test"]);
                assert_eq!(matches.get_one::<LogFormat>(ARG_LOG_FORMAT).copied(), Some(expected), "{value}");
            });
        }
    }

    #[test]
    fn rejects_unknown_log_format() {
        temp_env::with_vars([("LOG_FORMAT", Some("xml")), ("SCRY_LOG_LEVEL", None)], || {
            let result = with_args(Command::new("test")).try_get_matches_from(vec!["test"]);
            assert!(result.is_err());
        });
    }

    #[test]
    fn repeated_flag_counts() {
        temp_env::with_var("SCRY_LOG_LEVEL", None::<&str>, || {
            let matches = with_args(Command::new("test")).get_matches_from(vec!["test", "-vvv"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
        });
    }
}
