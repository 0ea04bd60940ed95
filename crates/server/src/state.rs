use crate::config::Config;
use crate::db;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state handed to every handler.
///
/// Cloning is cheap; the inner struct lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,
}

impl AppState {
    /// Connects to PostgreSQL and applies the schema.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        Ok(Self {
            inner: Arc::new(AppStateInner { db }),
        })
    }

    /// Database connection pool.
    pub fn db(&self) -> &PgPool {
        &self.inner.db
    }

    /// True when PostgreSQL responds to a ping.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
