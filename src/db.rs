//! Postgres readiness helpers for integration tests.

use crate::{dsn::CANDIDATES, env::Environment, mask::Masked};
use sqlx::{
    Connection, PgConnection, PgPool, Postgres, Transaction,
    migrate::{MigrateError, Migrator},
    postgres::PgPoolOptions,
};
use std::path::Path;
use thiserror::Error;
use tokio::time::{Duration, sleep, timeout};
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_ATTEMPTS: u32 = 20;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(250);

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("database connection timed out after {0:?}")]
    Timeout(Duration),
    #[error("database not ready after {attempts} attempts: {last}")]
    NotReady {
        attempts: u32,
        #[source]
        last: Box<DbError>,
    },
    #[error("failed to load migrations: {0}")]
    Migrate(#[from] MigrateError),
    #[error("failed to begin transaction: {0}")]
    Transaction(#[source] sqlx::Error),
}

/// True when no database URL variable is configured.
#[must_use]
pub fn should_skip_database_test(env: &Environment) -> bool {
    env.first_set(CANDIDATES.as_slice()).is_none()
}

/// Open and close a single connection.
///
/// # Errors
/// Returns [`DbError::Timeout`] if connecting takes longer than `limit`, or
/// [`DbError::Connect`] if Postgres rejects the connection.
pub async fn ping(url: &str, limit: Duration) -> Result<(), DbError> {
    debug!(url = %Masked(url), "pinging database");
    let connection = timeout(limit, PgConnection::connect(url))
        .await
        .map_err(|_| DbError::Timeout(limit))?
        .map_err(DbError::Connect)?;
    connection.close().await.map_err(DbError::Connect)
}

/// Ping until Postgres accepts connections, bounding each attempt by `limit`.
///
/// # Errors
/// Returns [`DbError::NotReady`] wrapping the last failure once `attempts`
/// pings have failed.
pub async fn wait_until_ready(
    url: &str,
    limit: Duration,
    attempts: u32,
    delay: Duration,
) -> Result<(), DbError> {
    let attempts = attempts.max(1);
    let mut tries = 0;

    loop {
        match ping(url, limit).await {
            Ok(()) => {
                info!(attempts = tries + 1, "database ready");
                return Ok(());
            }
            Err(err) => {
                tries += 1;
                if tries >= attempts {
                    return Err(DbError::NotReady {
                        attempts,
                        last: Box::new(err),
                    });
                }
                debug!(attempt = tries, error = %err, "database not ready yet");
                sleep(delay).await;
            }
        }
    }
}

/// # Errors
/// Returns [`DbError::Connect`] if the first connection cannot be opened
/// within `limit`.
pub async fn connect_pool(url: &str, limit: Duration) -> Result<PgPool, DbError> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(limit)
        .connect(url)
        .await
        .map_err(DbError::Connect)
}

/// Apply every migration under `dir`.
///
/// # Errors
/// Returns [`DbError::Migrate`] if the directory cannot be read or a
/// migration fails.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<(), DbError> {
    let migrator = Migrator::new(dir).await?;
    info!(
        dir = %dir.display(),
        count = migrator.iter().count(),
        "running migrations"
    );
    migrator.run(pool).await?;
    Ok(())
}

/// A transaction that rolls back when dropped without `commit`.
///
/// # Errors
/// Returns [`DbError::Transaction`] if no connection could be acquired.
pub async fn begin_isolated(pool: &PgPool) -> Result<Transaction<'static, Postgres>, DbError> {
    pool.begin().await.map_err(|err| {
        warn!(error = %err, "failed to begin isolated transaction");
        DbError::Transaction(err)
    })
}
