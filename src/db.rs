//! Database pool setup.
use std::str::FromStr as _;

use anyhow::{Context as _, Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

/// Open the main database, creating it if missing, and apply pending migrations.
#[tracing::instrument(skip_all)]
pub(crate) async fn establish_pool(database_url: &str) -> Result<SqlitePool> {
    tracing::debug!("establishing database connection pool");
    let opts = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("failed to parse database url {database_url:?}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(opts)
        .await
        .with_context(|| format!("error connecting to {database_url:?}"))?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to apply migrations")?;

    Ok(pool)
}

/// A migrated in-memory database. Every handle shares the single connection.
#[cfg(test)]
pub(crate) async fn memory_pool() -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;

    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}
