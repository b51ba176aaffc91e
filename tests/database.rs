use anyhow::Result;
use scry_testenv::{
    db::{self, DEFAULT_TIMEOUT},
    dsn::Resolver,
    env::Environment,
    logging::capture::log_test_skip,
    project::MIGRATION_TABLE_NAME,
};
use std::{
    fs,
    time::{SystemTime, UNIX_EPOCH},
};
use tempfile::TempDir;
use url::Url;

/// Resolved database URL, or `None` when the test should be skipped.
fn database_url(test_name: &str) -> Option<String> {
    let mut env = Environment::from_process();
    if db::should_skip_database_test(&env) {
        log_test_skip(test_name, "no database URL configured");
        return None;
    }
    Some(Resolver::default().resolve_in(&mut env).into_url())
}

/// `url` with every connection confined to `schema`.
fn with_search_path(url: &str, schema: &str) -> Result<String> {
    let mut url = Url::parse(url)?;
    url.query_pairs_mut()
        .append_pair("options", &format!("-c search_path={schema}"));
    Ok(url.into())
}

#[tokio::test]
async fn configured_database_accepts_connections() {
    let Some(url) = database_url("configured_database_accepts_connections") else {
        return;
    };
    if let Err(err) = db::ping(&url, DEFAULT_TIMEOUT).await {
        panic!("database ping failed: {err}");
    }
}

#[tokio::test]
async fn migrations_and_isolated_transactions() -> Result<()> {
    let Some(url) = database_url("migrations_and_isolated_transactions") else {
        return Ok(());
    };

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH)?.subsec_nanos();
    let schema = format!("scry_testenv_{}_{nanos}", std::process::id());
    let admin = db::connect_pool(&url, DEFAULT_TIMEOUT).await?;
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await?;

    let migrations = TempDir::new()?;
    fs::write(
        migrations.path().join("20240101000000_create_items.sql"),
        "CREATE TABLE items (id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL);\n",
    )?;

    let pool = db::connect_pool(&with_search_path(&url, &schema)?, DEFAULT_TIMEOUT).await?;
    db::run_migrations(&pool, migrations.path()).await?;

    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = $1 AND table_name = $2",
    )
    .bind(&schema)
    .bind(MIGRATION_TABLE_NAME)
    .fetch_one(&admin)
    .await?;
    assert_eq!(tables, 1);

    {
        let mut tx = db::begin_isolated(&pool).await?;
        sqlx::query("INSERT INTO items (name) VALUES ($1)")
            .bind("rolled back")
            .execute(&mut *tx)
            .await?;
        let inside: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&mut *tx)
            .await?;
        assert_eq!(inside, 1);
    }

    let after: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await?;
    assert_eq!(after, 0);

    pool.close().await;
    sqlx::query(&format!("DROP SCHEMA {schema} CASCADE"))
        .execute(&admin)
        .await?;
    admin.close().await;
    Ok(())
}
