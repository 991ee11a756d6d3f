//! Content item rows and request DTOs shared by articles and carousels.

use std::marker::PhantomData;

use discover_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::collection::{Articles, Carousels};

// ---------------------------------------------------------------------------
// Entity struct (database row)
// ---------------------------------------------------------------------------

/// A row from a content table (`articles` or `carousels`).
///
/// `C` ties the row to the table it was read from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct ContentItem<C> {
    pub id: DbId,
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    pub is_active: bool,
    pub position: Option<i32>,
    pub created_at: Timestamp,
    pub created_by: String,
    pub updated_at: Timestamp,
    pub updated_by: String,
    pub deleted_at: Option<Timestamp>,
    pub deleted_by: String,
    #[serde(skip)]
    collection: PhantomData<fn() -> C>,
}

/// A row from the `articles` table.
pub type Article = ContentItem<Articles>;

/// A row from the `carousels` table.
pub type Carousel = ContentItem<Carousels>;

impl<'r, C> FromRow<'r, PgRow> for ContentItem<C> {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            image_url: row.try_get("image_url")?,
            link_url: row.try_get("link_url")?,
            is_active: row.try_get("is_active")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
            created_by: row.try_get("created_by")?,
            updated_at: row.try_get("updated_at")?,
            updated_by: row.try_get("updated_by")?,
            deleted_at: row.try_get("deleted_at")?,
            deleted_by: row.try_get("deleted_by")?,
            collection: PhantomData,
        })
    }
}

// ---------------------------------------------------------------------------
// DTOs (request payloads)
// ---------------------------------------------------------------------------

/// DTO for creating a content item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContentItem {
    pub title: String,
    pub image_url: String,
    pub link_url: String,
    /// Falls back to the authenticated operator when blank.
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

/// DTO for soft-deleting a content item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContentItem {
    pub id: DbId,
    /// Falls back to the authenticated operator when blank.
    #[serde(default)]
    pub deleted_by: Option<String>,
}

/// DTO for partially updating a content item.
///
/// Blank or absent strings leave the stored value unchanged. `position` is
/// three-state: absent keeps the stored value, `null` clears it, a number
/// replaces it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContentItem {
    pub id: DbId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    /// Falls back to the authenticated operator when blank.
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub position: Option<Option<i32>>,
}

/// Deserialize a present field (including `null`) as `Some`, so a missing
/// field (handled by `#[serde(default)]`) stays distinguishable from `null`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
