//! Handlers for article and carousel management.
//!
//! Each handler is generic over the collection and is mounted once per
//! collection by [`crate::routes::discover`]. Management handlers require a
//! discover admin; the public find does not.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use discover_core::content::FindParams;
use discover_core::context::RequestContext;
use discover_core::error::CoreError;
use discover_db::models::content::{
    ContentItem, CreateContentItem, DeleteContentItem, UpdateContentItem,
};
use discover_db::RepoError;

use crate::error::AppResult;
use crate::extract::{AppJson, Ctx};
use crate::middleware::admin::RequireAdmin;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;
use crate::usecase::HasUseCase;

/// GET /discover/{collection}/find
///
/// Public listing of active items. An empty result is a 200 with
/// `total: 0`.
pub async fn find<C: HasUseCase>(
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Query(params): Query<FindParams>,
) -> AppResult<Json<PageResponse<ContentItem<C>>>> {
    find_page::<C>(&state, &ctx, &params).await
}

/// GET /bo/discover/{collection}/find
///
/// Admin listing; same contract as the public find.
pub async fn admin_find<C: HasUseCase>(
    RequireAdmin(operator): RequireAdmin,
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    Query(params): Query<FindParams>,
) -> AppResult<Json<PageResponse<ContentItem<C>>>> {
    let ctx = ctx.with_operator(operator.user_id);
    find_page::<C>(&state, &ctx, &params).await
}

async fn find_page<C: HasUseCase>(
    state: &AppState,
    ctx: &RequestContext,
    params: &FindParams,
) -> AppResult<Json<PageResponse<ContentItem<C>>>> {
    match C::use_case(&state.usecases).find(ctx, params).await {
        Ok((data, total)) => Ok(Json(PageResponse { total, data })),
        Err(RepoError::Core(CoreError::NotFound { .. })) => Ok(Json(PageResponse::empty())),
        Err(err) => Err(err.into()),
    }
}

/// POST /bo/discover/{collection}/add
///
/// Create an item. `createdBy` defaults to the calling operator.
pub async fn create<C: HasUseCase>(
    RequireAdmin(operator): RequireAdmin,
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    AppJson(input): AppJson<CreateContentItem>,
) -> AppResult<impl IntoResponse> {
    let ctx = ctx.with_operator(operator.user_id);
    let item = C::use_case(&state.usecases).create(&ctx, &input).await?;

    Ok(Json(DataResponse { data: item }))
}

/// DELETE /bo/discover/{collection}/del
///
/// Soft-delete an item. `deletedBy` defaults to the calling operator.
pub async fn delete<C: HasUseCase>(
    RequireAdmin(operator): RequireAdmin,
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    AppJson(input): AppJson<DeleteContentItem>,
) -> AppResult<impl IntoResponse> {
    let ctx = ctx.with_operator(operator.user_id);
    C::use_case(&state.usecases).delete(&ctx, &input).await?;

    Ok(Json(DataResponse { data: "deleted" }))
}

/// POST /bo/discover/{collection}/edit
///
/// Partially update an item. Responds with the item as it was before the
/// update.
pub async fn edit<C: HasUseCase>(
    RequireAdmin(operator): RequireAdmin,
    State(state): State<AppState>,
    Ctx(ctx): Ctx,
    AppJson(input): AppJson<UpdateContentItem>,
) -> AppResult<impl IntoResponse> {
    let ctx = ctx.with_operator(operator.user_id);
    let snapshot = C::use_case(&state.usecases).edit(&ctx, &input).await?;

    Ok(Json(DataResponse { data: snapshot }))
}
