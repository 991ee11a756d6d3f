use std::sync::Arc;

use crate::cache::TokenStore;
use crate::config::AppConfig;
use crate::usecase::UseCases;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: discover_db::DbPool,
    /// Loaded configuration files.
    pub config: Arc<AppConfig>,
    /// Content and health use cases, built once at startup.
    pub usecases: Arc<UseCases>,
    /// Issued-token status lookups for operator authentication.
    pub tokens: Arc<dyn TokenStore>,
}

impl AppState {
    pub fn new(
        pool: discover_db::DbPool,
        config: Arc<AppConfig>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let usecases = Arc::new(UseCases::new(pool.clone()));
        Self {
            pool,
            config,
            usecases,
            tokens,
        }
    }
}
