//! Shared response envelope types for API handlers.
//!
//! Single-item responses use a `{ "data": ... }` envelope; find responses add
//! the size of the filtered set as `{ "total": n, "data": [...] }`.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: item }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "total": n, "data": [...] }` envelope for one page of a find.
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    /// Number of matching items before pagination.
    pub total: i64,
    pub data: Vec<T>,
}

impl<T: Serialize> PageResponse<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            data: Vec::new(),
        }
    }
}
