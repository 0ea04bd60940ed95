//! Database connection pool and schema management.

use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Core schema, embedded at compile time. Every statement is idempotent,
/// so the whole file is reapplied on every boot.
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the PostgreSQL connection pool.
pub async fn create_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")
}

/// Applies the core schema.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    // raw_sql instead of query() because the schema file contains multiple
    // statements. query() uses prepared statements which only support a
    // single statement per call.
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await
        .context("failed to apply database schema")?;
    Ok(())
}

/// Returns true when the database responds to a trivial query.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
