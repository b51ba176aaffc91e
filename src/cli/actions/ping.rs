use crate::{
    db::{self, DEFAULT_DELAY, DbError},
    dsn::test_database_url,
    mask::Masked,
};
use anyhow::{Context, Result, bail};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Args {
    pub timeout: Duration,
    pub attempts: u32,
}

/// One ping, or a readiness poll when more than one attempt is allowed.
/// `timeout` bounds every attempt either way.
async fn check(url: &str, args: &Args) -> Result<(), DbError> {
    if args.attempts > 1 {
        db::wait_until_ready(url, args.timeout, args.attempts, DEFAULT_DELAY).await
    } else {
        db::ping(url, args.timeout).await
    }
}

/// Resolve the database URL and check that Postgres accepts connections.
///
/// # Errors
/// Returns an error if no URL is configured or every attempt fails.
pub async fn execute(args: Args) -> Result<()> {
    let url = test_database_url();
    if url.is_empty() {
        bail!("no database URL configured; set SCRY_TEST_DB_URL");
    }

    check(&url, &args)
        .await
        .with_context(|| format!("database at {} is not reachable", Masked(&url)))?;

    info!(url = %Masked(&url), "database reachable");
    println!("ok");
    Ok(())
}
