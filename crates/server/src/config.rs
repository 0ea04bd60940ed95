use anyhow::{Context, Result};
use std::env;

/// Application configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server listens on.
    pub port: u16,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Maximum connections in the PostgreSQL pool.
    pub database_max_connections: u32,
    /// Origins allowed by the CORS layer. `*` means any origin.
    pub cors_allowed_origins: Vec<String>,
    /// SameSite policy for the session cookie: `strict`, `lax` or `none`.
    pub cookie_same_site: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid u16")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            cookie_same_site: env::var("COOKIE_SAME_SITE")
                .unwrap_or_else(|_| "strict".to_string())
                .to_lowercase(),
        })
    }
}
