//! Access control for content management routes.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use discover_core::error::CoreError;

use super::auth::Operator;
use crate::error::AppError;
use crate::state::AppState;

/// Requires an operator listed in `share.discoverAdmin`. Rejects with
/// 401 Unauthenticated otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(op): RequireAdmin) -> AppResult<Json<()>> {
///     // op is guaranteed to be a discover admin here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub Operator);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let operator = Operator::from_request_parts(parts, state).await?;
        if !is_admin(&state.config.share.discover_admin, &operator.user_id) {
            tracing::warn!(user_id = %operator.user_id, "Non-admin attempted content management");
            return Err(AppError::Core(CoreError::Unauthenticated(
                "Discover admin required".into(),
            )));
        }
        Ok(RequireAdmin(operator))
    }
}

fn is_admin(admins: &[String], user_id: &str) -> bool {
    admins.iter().any(|admin| admin == user_id)
}
