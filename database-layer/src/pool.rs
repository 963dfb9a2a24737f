//! Connection pool setup (§5): bounded `sqlx::PgPool`, defaults matching
//! the spec's resource model, overridable by the `DB_*` environment
//! variables the binary crate reads into [`PoolSettings`].

use crate::error::{DatabaseError, DatabaseResult};
use sqlx::postgres::{PgPoolOptions, PgPool};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 4,
            min_connections: 1,
            idle_timeout: Duration::from_secs(30 * 60),
            max_lifetime: Duration::from_secs(60 * 60),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Opens the pool and performs the initial connectivity ping (§7: a
/// database unreachable at startup is fatal).
pub async fn connect(database_url: &str, settings: PoolSettings) -> DatabaseResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .idle_timeout(settings.idle_timeout)
        .max_lifetime(settings.max_lifetime)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    Ok(pool)
}

/// Health-check predicate backing `GET /healthz` (§6.1): pings the pool
/// with a trivial query and reports whether it answered.
pub async fn is_healthy(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
