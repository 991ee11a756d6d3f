//! The HTTP surface: routes plus the request middleware, assembled once for
//! the lifecycle and for the integration tests.

use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ApiConfig;
use crate::extract::REQUEST_ID_HEADER;
use crate::routes;
use crate::state::AppState;

/// Routes wrapped, outermost first, in CORS, request-id assignment, request
/// tracing, request-id echo, the per-request timeout (408) and panic
/// recovery (500).
pub fn build_app_router(state: AppState, config: &ApiConfig) -> Result<Router, RouterError> {
    let cors = build_cors_layer(config)?;
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);
    Ok(router)
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Credentialed CORS cannot answer with `*`; origins must be listed.
    #[error("corsOrigins must list explicit origins, \"*\" is not allowed with credentials")]
    WildcardOrigin,
}

/// CORS for the configured origins and the headers operators send.
///
/// Origins that are not valid header values are skipped with a warning. A
/// `*` entry is rejected.
pub fn build_cors_layer(config: &ApiConfig) -> Result<CorsLayer, RouterError> {
    if config.cors_origins.iter().any(|o| o.trim() == "*") {
        return Err(RouterError::WildcardOrigin);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static("token"),
            HeaderName::from_static("operationid"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));
    Ok(layer)
}
