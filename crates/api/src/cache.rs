//! Token-status lookups against the shared Redis cache.
//!
//! The account service records the status of every issued token in a hash
//! per user, `CHAT_UID_TOKEN_STATUS:<userID>`, keyed by the token string.
//! A status of [`TOKEN_STATUS_NORMAL`] means the token is still usable;
//! anything else (kicked, expired) or a missing field rejects it.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::config::RedisConfig;

/// Hash key prefix holding per-user token statuses.
pub const TOKEN_STATUS_KEY_PREFIX: &str = "CHAT_UID_TOKEN_STATUS:";

/// Status value of a token that has not been revoked.
pub const TOKEN_STATUS_NORMAL: &str = "0";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis address is not configured")]
    MissingAddress,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Read access to issued-token statuses.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// All `token -> status` pairs recorded for `user_id`.
    async fn token_statuses(&self, user_id: &str) -> Result<HashMap<String, String>, CacheError>;

    /// Whether `token` is recorded for `user_id` with a normal status.
    async fn is_token_active(&self, user_id: &str, token: &str) -> Result<bool, CacheError> {
        let statuses = self.token_statuses(user_id).await?;
        Ok(statuses.get(token).map(String::as_str) == Some(TOKEN_STATUS_NORMAL))
    }
}

/// [`TokenStore`] backed by a multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisTokenStore {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTokenStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisTokenStore {
    /// Connect to the first configured Redis endpoint.
    pub async fn connect(config: &RedisConfig) -> Result<Self, CacheError> {
        let url = config.url().ok_or(CacheError::MissingAddress)?;
        let address = config.address.first().map(String::as_str).unwrap_or_default();
        tracing::info!(address, db = config.db, "Connecting to Redis token cache");

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!("Connected to Redis token cache");
        Ok(Self { conn })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn token_statuses(&self, user_id: &str) -> Result<HashMap<String, String>, CacheError> {
        let key = format!("{TOKEN_STATUS_KEY_PREFIX}{user_id}");
        let mut conn = self.conn.clone();
        let statuses: HashMap<String, String> = conn.hgetall(&key).await?;
        tracing::debug!(user_id, tokens = statuses.len(), "Loaded token statuses");
        Ok(statuses)
    }
}
