//! Persistence for the discover feed: row models, the shared content
//! repository, schema migrations and default seed data.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod collection;
pub mod error;
pub mod models;
pub mod repositories;
pub mod seed;

pub use error::{RepoError, RepoResult};

pub type DbPool = sqlx::PgPool;

/// Default upper bound on pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from explicit connection settings.
pub async fn create_pool(
    options: PgConnectOptions,
    max_connections: u32,
) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Round-trip a trivial query to prove the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations. Already-applied migrations are skipped and
/// every statement is create-if-missing, so this never drops data.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
