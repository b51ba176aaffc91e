use crate::{
    dsn::{CiMode, CredentialPolicy, Outcome, Resolution, Resolver},
    env::Environment,
    mask::Masked,
};
use anyhow::{Result, bail};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeChoice {
    /// Detect CI from the environment.
    #[default]
    Auto,
    Ci,
    Local,
}

#[derive(Debug, Clone, Default)]
pub struct Args {
    pub mode: ModeChoice,
    pub strict: bool,
    pub show_secrets: bool,
    pub export: bool,
}

impl Args {
    /// Resolver mode for `env`; `strict` upgrades any CI mode to
    /// [`CredentialPolicy::ForceBoth`].
    #[must_use]
    pub fn ci_mode(&self, env: &Environment) -> CiMode {
        let mode = match self.mode {
            ModeChoice::Auto => CiMode::detect(env),
            ModeChoice::Ci => CiMode::Ci(CredentialPolicy::PreservePassword),
            ModeChoice::Local => CiMode::Local,
        };
        match mode {
            CiMode::Ci(_) if self.strict => CiMode::Ci(CredentialPolicy::ForceBoth),
            mode => mode,
        }
    }
}

/// Quote `value` for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Lines printed for a resolution.
#[must_use]
pub fn render(resolution: &Resolution, args: &Args) -> Vec<String> {
    if args.export {
        return resolution
            .updates()
            .iter()
            .map(|(variable, value)| format!("export {variable}={}", shell_quote(value)))
            .collect();
    }

    let url = if args.show_secrets {
        resolution.url().to_string()
    } else {
        Masked(resolution.url()).to_string()
    };
    vec![url]
}

/// Resolve the database URL from the process environment and print it.
///
/// # Errors
/// Returns an error if no database URL variable is set.
pub fn execute(args: &Args) -> Result<()> {
    let env = Environment::from_process();
    let resolution = Resolver::default().resolve(&env, args.ci_mode(&env));

    if resolution.is_empty() {
        bail!("no database URL configured; set SCRY_TEST_DB_URL");
    }
    if let Outcome::Fallback(err) = resolution.outcome() {
        warn!(error = %err, "returning database URL without standardization");
    }

    for line in render(&resolution, args) {
        println!("{line}");
    }
    Ok(())
}
