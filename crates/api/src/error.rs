//! HTTP rendering of every error a handler can return.
//!
//! Responses carry `{ "error": <message>, "code": <CODE> }`. Server-side
//! failures are logged here and reach the client only as a generic message.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use discover_core::error::CoreError;
use discover_db::RepoError;
use serde_json::json;

use crate::cache::CacheError;

/// PostgreSQL SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure the repository did not classify.
    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),

    /// Token statuses could not be read.
    #[error("Token cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Unexpected failure: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Core(core) => AppError::Core(core),
            RepoError::Database(db) => AppError::Database(db),
        }
    }
}

/// Malformed or mistyped JSON bodies are argument errors, not 422s.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Core(CoreError::Validation(rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Core(core) => core_parts(core),
            AppError::Database(err) => storage_parts(&err),
            AppError::Cache(err) => {
                tracing::error!(error = %err, "Token status lookup failed");
                server_failure()
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Unexpected failure");
                server_failure()
            }
        };

        let envelope = json!({ "error": message, "code": code });
        (status, axum::Json(envelope)).into_response()
    }
}

type Rendered = (StatusCode, &'static str, String);

fn core_parts(err: CoreError) -> Rendered {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("no active {entity} with id {id}"),
        ),
        CoreError::DuplicateTitle { .. } => (StatusCode::CONFLICT, "DUPLICATE_TITLE", err.to_string()),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        CoreError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg),
        CoreError::Cancelled => (
            StatusCode::SERVICE_UNAVAILABLE,
            "CANCELLED",
            "request cancelled before completion".to_string(),
        ),
        CoreError::DeadlineExceeded => (
            StatusCode::REQUEST_TIMEOUT,
            "DEADLINE_EXCEEDED",
            "request deadline exceeded".to_string(),
        ),
        CoreError::Configuration(msg) | CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Domain layer reported an internal failure");
            server_failure()
        }
    }
}

fn server_failure() -> Rendered {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "internal server error".to_string(),
    )
}

/// A unique-index violation on a `uq_*` index the repository did not map
/// itself is still a title conflict; anything else is a 500.
fn storage_parts(err: &sqlx::Error) -> Rendered {
    if let sqlx::Error::Database(db_err) = err {
        let unique = db_err.code().as_deref() == Some(UNIQUE_VIOLATION);
        if let Some(index) = db_err.constraint().filter(|c| unique && c.starts_with("uq_")) {
            return (
                StatusCode::CONFLICT,
                "DUPLICATE_TITLE",
                format!("title already in use ({index})"),
            );
        }
    }
    tracing::error!(error = %err, "Storage call failed");
    server_failure()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn core_errors_map_to_http_statuses() {
        let cases = [
            (
                AppError::Core(CoreError::NotFound { entity: "article", id: 3 }),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::Core(CoreError::DuplicateTitle {
                    entity: "article",
                    title: "A".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                AppError::Core(CoreError::Validation("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Core(CoreError::Unauthenticated("no".into())),
                StatusCode::UNAUTHORIZED,
            ),
            (AppError::Core(CoreError::Cancelled), StatusCode::SERVICE_UNAVAILABLE),
            (AppError::Core(CoreError::DeadlineExceeded), StatusCode::REQUEST_TIMEOUT),
            (
                AppError::Core(CoreError::Internal("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(status_of(err), expected);
        }
    }

    #[test]
    fn repo_errors_unwrap_domain_errors() {
        let err: AppError = RepoError::Core(CoreError::Cancelled).into();
        assert!(matches!(err, AppError::Core(CoreError::Cancelled)));
    }
}
