//! Query and payload rules shared by the article and carousel collections.
//!
//! Both collections expose the same find/create/edit/delete contract, so the
//! parsing of list parameters and the required-field checks live here once.

use std::fmt;

use serde::Deserialize;

use crate::error::CoreError;
use crate::types::DbId;

/* --------------------------------------------------------------------------
   Defaults and limits
   -------------------------------------------------------------------------- */

/// Page used when the `page` parameter is absent or blank.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the `limit` parameter is absent or blank.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a caller may request.
pub const MAX_LIMIT: i64 = 100;

/* --------------------------------------------------------------------------
   Sorting
   -------------------------------------------------------------------------- */

/// Column a find request orders by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Display position; rows without a position always come last.
    #[default]
    Position,
    /// Creation timestamp.
    CreatedAt,
}

impl SortField {
    /// Parse the `sortBy` parameter. Matching is case-insensitive and a blank
    /// value selects the default.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_lowercase().as_str() {
            "" | "position" => Ok(Self::Position),
            "created_at" => Ok(Self::CreatedAt),
            _ => Err(CoreError::Validation(
                "invalid sortBy query param: must be position or created_at".to_string(),
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a find request's ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse the `order` parameter. Matching is case-insensitive and a blank
    /// value selects the default.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        match raw.trim().to_uppercase().as_str() {
            "" | "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(CoreError::Validation(
                "invalid order query param: must be ASC or DESC".to_string(),
            )),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/* --------------------------------------------------------------------------
   Find parameters
   -------------------------------------------------------------------------- */

/// Raw `?id=&page=&limit=&title=&sortBy=&order=` query string.
///
/// Every field is kept as text so malformed numbers surface as
/// [`CoreError::Validation`] instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindParams {
    pub id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// A validated find request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindQuery {
    /// Exact id filter; `0` matches every id.
    pub id: DbId,
    /// Case-sensitive substring filter on the title; empty matches all.
    pub title: String,
    pub sort_by: SortField,
    pub order: SortOrder,
    /// 1-based page number.
    pub page: i64,
    /// Page size in `1..=MAX_LIMIT`.
    pub limit: i64,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            sort_by: SortField::default(),
            order: SortOrder::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl FindQuery {
    /// Parse and validate raw query parameters, filling defaults for
    /// absent or blank values.
    pub fn parse(params: &FindParams) -> Result<Self, CoreError> {
        let id = match non_blank(params.id.as_deref()) {
            None => 0,
            Some(raw) => raw
                .parse::<DbId>()
                .ok()
                .filter(|id| *id >= 0)
                .ok_or_else(|| CoreError::Validation("invalid id query param".to_string()))?,
        };

        let page = parse_number(params.page.as_deref(), DEFAULT_PAGE, "page")?;
        let limit = parse_number(params.limit.as_deref(), DEFAULT_LIMIT, "limit")?;

        let query = Self {
            id,
            title: params.title.clone().unwrap_or_default(),
            sort_by: SortField::parse(params.sort_by.as_deref().unwrap_or_default())?,
            order: SortOrder::parse(params.order.as_deref().unwrap_or_default())?,
            page,
            limit,
        };
        query.validate()?;
        Ok(query)
    }

    /// Check pagination bounds.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.id < 0 {
            return Err(CoreError::Validation("invalid id query param".to_string()));
        }
        if self.page < 1 {
            return Err(CoreError::Validation(format!(
                "invalid pagination number: page must be >= 1, got {}",
                self.page
            )));
        }
        if self.limit < 1 || self.limit > MAX_LIMIT {
            return Err(CoreError::Validation(format!(
                "invalid pagination number: limit must be between 1 and {MAX_LIMIT}, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    /// Number of rows skipped before the requested page. Saturates, so an
    /// absurdly large page simply lands past the end of the set.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number(raw: Option<&str>, default: i64, name: &str) -> Result<i64, CoreError> {
    match non_blank(raw) {
        None => Ok(default),
        Some(value) => value
            .parse::<i64>()
            .map_err(|_| CoreError::Validation(format!("invalid {name} query param"))),
    }
}

/* --------------------------------------------------------------------------
   Payload checks
   -------------------------------------------------------------------------- */

/// Require every field needed to create a content item.
pub fn validate_new_item(title: &str, image_url: &str, link_url: &str) -> Result<(), CoreError> {
    for (name, value) in [("title", title), ("imageUrl", image_url), ("linkUrl", link_url)] {
        if value.trim().is_empty() {
            return Err(CoreError::Validation(format!("{name} must not be empty")));
        }
    }
    Ok(())
}

/// Require a positive id on delete and edit payloads.
pub fn validate_item_id(id: DbId) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::Validation(format!(
            "id must be a positive integer, got {id}"
        )));
    }
    Ok(())
}

/// Pick the explicit actor from a payload, falling back to the operator.
///
/// Audit columns (`createdBy`, `updatedBy`, `deletedBy`) accept an explicit
/// value from the request body; when it is blank the authenticated operator
/// is recorded instead.
pub fn resolve_actor(explicit: Option<&str>, operator: Option<&str>) -> Result<String, CoreError> {
    non_blank(explicit)
        .or_else(|| non_blank(operator))
        .map(str::to_string)
        .ok_or_else(|| CoreError::Unauthenticated("user id not found".to_string()))
}
