pub mod discover;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the content route tree.
///
/// Route hierarchy:
///
/// ```text
/// /discover/article/find            public list (GET)
/// /discover/article/del             soft delete (DELETE, admin)
/// /discover/article/edit            partial update (POST, admin)
///
/// /bo/discover/article/find         admin list (GET)
/// /bo/discover/article/add          create (POST)
/// /bo/discover/article/del          soft delete (DELETE)
/// /bo/discover/article/edit         partial update (POST)
///
/// /discover/carousel/...            same as article
/// /bo/discover/carousel/...         same as article
/// ```
pub fn api_routes() -> Router<AppState> {
    discover::router()
}
