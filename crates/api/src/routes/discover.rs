use axum::routing::{delete, get, post};
use axum::Router;
use discover_db::collection::{Articles, Carousels};

use crate::handlers::content;
use crate::state::AppState;
use crate::usecase::HasUseCase;

/// Public paths. `del` and `edit` are kept here for older clients and are
/// still admin-only.
fn public<C: HasUseCase>() -> Router<AppState> {
    Router::new()
        .route("/find", get(content::find::<C>))
        .route("/del", delete(content::delete::<C>))
        .route("/edit", post(content::edit::<C>))
}

/// Back-office paths, all admin-only.
fn backoffice<C: HasUseCase>() -> Router<AppState> {
    Router::new()
        .route("/find", get(content::admin_find::<C>))
        .route("/add", post(content::create::<C>))
        .route("/del", delete(content::delete::<C>))
        .route("/edit", post(content::edit::<C>))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/discover/article", public::<Articles>())
        .nest("/discover/carousel", public::<Carousels>())
        .nest("/bo/discover/article", backoffice::<Articles>())
        .nest("/bo/discover/carousel", backoffice::<Carousels>())
}
