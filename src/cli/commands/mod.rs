pub mod logging;

use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_RESOLVE: &str = "resolve";
pub const CMD_MASK: &str = "mask";
pub const CMD_REDACT: &str = "redact";
pub const CMD_ROOT: &str = "root";
pub const CMD_PING: &str = "ping";

pub const ARG_CI: &str = "ci";
pub const ARG_LOCAL: &str = "local";
pub const ARG_STRICT: &str = "strict";
pub const ARG_SHOW_SECRETS: &str = "show-secrets";
pub const ARG_EXPORT: &str = "export";
pub const ARG_VALUE: &str = "value";
pub const ARG_TEXT: &str = "text";
pub const ARG_MIGRATIONS: &str = "migrations";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_ATTEMPTS: &str = "attempts";

fn resolve_command() -> Command {
    Command::new(CMD_RESOLVE)
        .about("Resolve the test database URL from the environment")
        .arg(
            Arg::new(ARG_CI)
                .long("ci")
                .help("Standardize as if running in CI")
                .action(ArgAction::SetTrue)
                .conflicts_with(ARG_LOCAL),
        )
        .arg(
            Arg::new(ARG_LOCAL)
                .long("local")
                .help("Return the configured URL unchanged")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_STRICT)
                .long("strict")
                .help("Force both CI username and password")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_SHOW_SECRETS)
                .long("show-secrets")
                .help("Print the URL without masking the password")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_EXPORT)
                .long("export")
                .help("Print shell export lines for every variable that needs updating")
                .action(ArgAction::SetTrue),
        )
}

fn ping_command() -> Command {
    Command::new(CMD_PING)
        .about("Check that the resolved database accepts connections")
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Seconds to wait for each connection attempt")
                .default_value("5")
                .env("SCRY_DB_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_ATTEMPTS)
                .long("attempts")
                .help("Connection attempts before giving up")
                .default_value("1")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("scry-testenv")
        .about("Test environment helpers: database URL resolution, masking and redaction")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(resolve_command())
        .subcommand(
            Command::new(CMD_MASK)
                .about("Mask a sensitive value the way log output does")
                .arg(Arg::new(ARG_VALUE).required(true)),
        )
        .subcommand(
            Command::new(CMD_REDACT)
                .about("Redact sensitive fragments from text (reads stdin when no text is given)")
                .arg(Arg::new(ARG_TEXT).num_args(1..)),
        )
        .subcommand(
            Command::new(CMD_ROOT)
                .about("Print the project root")
                .arg(
                    Arg::new(ARG_MIGRATIONS)
                        .long("migrations")
                        .help("Print the migrations directory instead")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(ping_command());

    logging::with_args(command)
}
