//! Request extractors shared by the content handlers.

use std::time::Duration;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use discover_core::context::RequestContext;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Header a caller uses to correlate its own logs with ours.
pub const OPERATION_ID_HEADER: &str = "operationID";

/// Header set by the request-id middleware.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// JSON body extractor whose rejections use the API error envelope.
///
/// Malformed JSON and missing or mistyped fields become 400
/// `VALIDATION_ERROR` responses instead of axum's plain-text 4xx.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// A fresh [`RequestContext`] for the current request.
///
/// The operation id comes from `operationID`, then `x-request-id`, then a new
/// UUID. The deadline is the configured request timeout. When
/// `share.proxyHeader` is set, the forwarded client address is logged with
/// the operation id.
pub struct Ctx(pub RequestContext);

impl FromRequestParts<AppState> for Ctx {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let timeout = Duration::from_secs(state.config.api.request_timeout_secs);
        let ctx = RequestContext::new(operation_id(&parts.headers)).with_timeout(timeout);
        if let Some(client) = client_addr(&parts.headers, &state.config.share.proxy_header) {
            tracing::debug!(
                operation_id = %ctx.operation_id(),
                client = %client,
                "Request from proxied client"
            );
        }
        Ok(Ctx(ctx))
    }
}

fn operation_id(headers: &HeaderMap) -> String {
    [OPERATION_ID_HEADER, REQUEST_ID_HEADER]
        .into_iter()
        .find_map(|name| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Original client address from `proxy_header`, the first hop of a
/// comma-separated forwarding chain. `None` when no header is configured.
fn client_addr(headers: &HeaderMap, proxy_header: &str) -> Option<String> {
    if proxy_header.is_empty() {
        return None;
    }
    headers
        .get(proxy_header)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
