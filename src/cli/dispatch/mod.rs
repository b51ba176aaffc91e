//! Map parsed CLI arguments to an [`Action`].

use crate::cli::actions::{
    Action, ping,
    resolve::{self, ModeChoice},
};
use crate::cli::commands::{
    ARG_ATTEMPTS, ARG_CI, ARG_EXPORT, ARG_LOCAL, ARG_MIGRATIONS, ARG_SHOW_SECRETS, ARG_STRICT,
    ARG_TEXT, ARG_TIMEOUT, ARG_VALUE, CMD_MASK, CMD_PING, CMD_REDACT, CMD_RESOLVE, CMD_ROOT,
};
use anyhow::{Context, Result, bail};
use std::time::Duration;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if no known subcommand was given.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_RESOLVE, sub)) => {
            let mode = if sub.get_flag(ARG_CI) {
                ModeChoice::Ci
            } else if sub.get_flag(ARG_LOCAL) {
                ModeChoice::Local
            } else {
                ModeChoice::Auto
            };
            Ok(Action::Resolve(resolve::Args {
                mode,
                strict: sub.get_flag(ARG_STRICT),
                show_secrets: sub.get_flag(ARG_SHOW_SECRETS),
                export: sub.get_flag(ARG_EXPORT),
            }))
        }
        Some((CMD_MASK, sub)) => {
            let value = sub
                .get_one::<String>(ARG_VALUE)
                .cloned()
                .context("missing required argument: VALUE")?;
            Ok(Action::Mask { value })
        }
        Some((CMD_REDACT, sub)) => {
            let text = sub
                .get_many::<String>(ARG_TEXT)
                .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "));
            Ok(Action::Redact { text })
        }
        Some((CMD_ROOT, sub)) => Ok(Action::Root {
            migrations: sub.get_flag(ARG_MIGRATIONS),
        }),
        Some((CMD_PING, sub)) => Ok(Action::Ping(ping::Args {
            timeout: Duration::from_secs(sub.get_one::<u64>(ARG_TIMEOUT).copied().unwrap_or(5)),
            attempts: sub.get_one::<u32>(ARG_ATTEMPTS).copied().unwrap_or(1),
        })),
        Some((name, _)) => bail!("unknown command: {name}"),
        None => bail!("missing command"),
    }
}
