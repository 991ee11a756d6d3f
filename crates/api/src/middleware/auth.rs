//! Operator-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use discover_core::error::CoreError;

use crate::auth::token::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Header the operator token is sent in.
pub const TOKEN_HEADER: &str = "token";

/// Operator identified by a valid, non-revoked token.
///
/// The token is read from the `token` header, or from
/// `Authorization: Bearer <token>` when that header is absent.
///
/// ```ignore
/// async fn my_handler(operator: Operator) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %operator.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Operator {
    pub user_id: String,
    pub platform_id: i32,
}

impl FromRequestParts<AppState> for Operator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or_else(|| {
            AppError::Core(CoreError::Unauthenticated("Missing token".into()))
        })?;

        let claims = validate_token(token, &state.config.admin).map_err(|_| {
            AppError::Core(CoreError::Unauthenticated("Invalid or expired token".into()))
        })?;

        if !state.tokens.is_token_active(&claims.user_id, token).await? {
            return Err(AppError::Core(CoreError::Unauthenticated(
                "Token has been revoked".into(),
            )));
        }

        Ok(Operator {
            user_id: claims.user_id,
            platform_id: claims.platform_id,
        })
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let raw = headers
        .get(TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|t| !t.is_empty());
    raw.or_else(|| {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    })
}
