use anyhow::{Context, Result};
use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

/// Hours of inactivity before a session expires.
pub const DEFAULT_SESSION_EXPIRY_HOURS: i64 = 24;

/// Seconds between sweeps of expired session rows.
const EXPIRED_SESSION_SWEEP_SECS: u64 = 300;

/// Builds the session layer, backed by the same PostgreSQL pool as the rest
/// of the application. Creates the session table if it does not exist yet and
/// spawns a detached task that periodically deletes expired rows.
pub async fn create_session_layer(
    pool: PgPool,
    same_site: SameSite,
) -> Result<SessionManagerLayer<PostgresStore>> {
    let store = PostgresStore::new(pool);
    store
        .migrate()
        .await
        .context("failed to migrate session store schema")?;

    tokio::task::spawn(
        store
            .clone()
            .continuously_delete_expired(tokio::time::Duration::from_secs(
                EXPIRED_SESSION_SWEEP_SECS,
            )),
    );

    Ok(SessionManagerLayer::new(store)
        // Cookie only sent over HTTPS
        .with_secure(true)
        // Not readable from JavaScript
        .with_http_only(true)
        .with_same_site(same_site)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            DEFAULT_SESSION_EXPIRY_HOURS,
        ))))
}
