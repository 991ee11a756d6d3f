//! Repository for the content tables (`articles`, `carousels`).
//!
//! One implementation serves both collections; the [`Collection`] marker picks
//! the table. Only active rows (`is_active = true AND deleted_at IS NULL`) are
//! visible to find, edit and delete. Rows are never physically removed.
//!
//! Title uniqueness among active rows is checked before each write and backed
//! by the partial unique index `uq_<table>_active_title`; a violation of that
//! index is reported as [`CoreError::DuplicateTitle`] just like the pre-check.

use std::marker::PhantomData;

use discover_core::content::{FindQuery, SortField, SortOrder};
use discover_core::context::RequestContext;
use discover_core::error::CoreError;
use discover_core::types::DbId;
use sqlx::PgPool;

use crate::collection::Collection;
use crate::error::{is_unique_violation, RepoError, RepoResult};
use crate::models::content::{ContentItem, CreateContentItem, UpdateContentItem};

/// Column list for content table queries.
const COLUMNS: &str = "id, title, image_url, link_url, is_active, position, \
    created_at, created_by, updated_at, updated_by, deleted_at, deleted_by";

/// Predicate selecting rows that are still live.
const ACTIVE: &str = "is_active = true AND deleted_at IS NULL";

/// Provides CRUD operations for one content collection.
pub struct ContentRepo<C>(PhantomData<C>);

impl<C: Collection> ContentRepo<C> {
    /// Insert a new active item.
    ///
    /// Fails with [`CoreError::DuplicateTitle`] if an active item already holds
    /// the title, whether caught by the pre-check or by the unique index.
    pub async fn create(
        pool: &PgPool,
        ctx: &RequestContext,
        input: &CreateContentItem,
        created_by: &str,
    ) -> RepoResult<ContentItem<C>> {
        if Self::title_taken(pool, ctx, &input.title, None).await? {
            return Err(Self::duplicate(&input.title));
        }

        let query = format!(
            "INSERT INTO {table} \
                 (title, image_url, link_url, is_active, position, created_by, updated_by) \
             VALUES ($1, $2, $3, true, $4, $5, $5) \
             RETURNING {COLUMNS}",
            table = C::TABLE,
        );
        ctx.run(async {
            sqlx::query_as::<_, ContentItem<C>>(&query)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(&input.link_url)
                .bind(input.position)
                .bind(created_by)
                .fetch_one(pool)
                .await
                .map_err(|e| Self::map_write_error(e, &input.title))
        })
        .await
    }

    /// Find one page of active items plus the total number of matches.
    ///
    /// `total` counts the filtered set before pagination. An empty filtered
    /// set fails with [`CoreError::NotFound`].
    pub async fn find(
        pool: &PgPool,
        ctx: &RequestContext,
        query: &FindQuery,
    ) -> RepoResult<(Vec<ContentItem<C>>, i64)> {
        query.validate()?;

        let filter = format!(
            "{ACTIVE} \
               AND ($1::BIGINT = 0 OR id = $1) \
               AND ($2::TEXT = '' OR strpos(title, $2) > 0)"
        );

        let count_sql = format!("SELECT COUNT(*) FROM {table} WHERE {filter}", table = C::TABLE);
        let total: i64 = ctx
            .run(async {
                sqlx::query_scalar::<_, i64>(&count_sql)
                    .bind(query.id)
                    .bind(&query.title)
                    .fetch_one(pool)
                    .await
                    .map_err(RepoError::from)
            })
            .await?;

        if total == 0 {
            return Err(CoreError::NotFound {
                entity: C::ENTITY,
                id: query.id,
            }
            .into());
        }

        let list_sql = format!(
            "SELECT {COLUMNS} FROM {table} \
             WHERE {filter} \
             ORDER BY {order} \
             LIMIT $3 OFFSET $4",
            table = C::TABLE,
            order = order_clause(query.sort_by, query.order),
        );
        let items = ctx
            .run(async {
                sqlx::query_as::<_, ContentItem<C>>(&list_sql)
                    .bind(query.id)
                    .bind(&query.title)
                    .bind(query.limit)
                    .bind(query.offset())
                    .fetch_all(pool)
                    .await
                    .map_err(RepoError::from)
            })
            .await?;

        Ok((items, total))
    }

    /// Find an active item by ID. Deleted items are treated as absent.
    pub async fn find_active_by_id(
        pool: &PgPool,
        ctx: &RequestContext,
        id: DbId,
    ) -> RepoResult<Option<ContentItem<C>>> {
        let query = format!(
            "SELECT {COLUMNS} FROM {table} WHERE id = $1 AND {ACTIVE}",
            table = C::TABLE,
        );
        ctx.run(async {
            sqlx::query_as::<_, ContentItem<C>>(&query)
                .bind(id)
                .fetch_optional(pool)
                .await
                .map_err(RepoError::from)
        })
        .await
    }

    /// Soft-delete an active item, recording who deleted it and when.
    ///
    /// The update only matches active rows, so deleting an unknown or already
    /// deleted id fails with [`CoreError::NotFound`] and a row is marked
    /// deleted at most once.
    pub async fn delete(
        pool: &PgPool,
        ctx: &RequestContext,
        id: DbId,
        deleted_by: &str,
    ) -> RepoResult<()> {
        let query = format!(
            "UPDATE {table} \
             SET is_active = false, deleted_at = NOW(), deleted_by = $2 \
             WHERE id = $1 AND {ACTIVE}",
            table = C::TABLE,
        );
        let result = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(id)
                    .bind(deleted_by)
                    .execute(pool)
                    .await
                    .map_err(RepoError::from)
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    /// Partially update an active item.
    ///
    /// Blank strings keep the stored value; `position` follows the three-state
    /// rule of [`UpdateContentItem`]. `updated_by` and `updated_at` are always
    /// written.
    ///
    /// Returns the item as it was read *before* the update is applied.
    pub async fn edit(
        pool: &PgPool,
        ctx: &RequestContext,
        input: &UpdateContentItem,
        updated_by: &str,
    ) -> RepoResult<ContentItem<C>> {
        let existing = Self::find_active_by_id(pool, ctx, input.id)
            .await?
            .ok_or_else(|| Self::not_found(input.id))?;

        let title = non_blank(input.title.as_deref());
        if let Some(title) = title {
            if Self::title_taken(pool, ctx, title, Some(input.id)).await? {
                return Err(Self::duplicate(title));
            }
        }

        let position_provided = input.position.is_some();
        let position_value = input.position.flatten();

        let query = format!(
            "UPDATE {table} SET \
                 title      = COALESCE($2, title), \
                 image_url  = COALESCE($3, image_url), \
                 link_url   = COALESCE($4, link_url), \
                 position   = CASE WHEN $5 THEN $6 ELSE position END, \
                 updated_by = $7, \
                 updated_at = NOW() \
             WHERE id = $1 AND {ACTIVE}",
            table = C::TABLE,
        );
        let result = ctx
            .run(async {
                sqlx::query(&query)
                    .bind(input.id)
                    .bind(title)
                    .bind(non_blank(input.image_url.as_deref()))
                    .bind(non_blank(input.link_url.as_deref()))
                    .bind(position_provided)
                    .bind(position_value)
                    .bind(updated_by)
                    .execute(pool)
                    .await
                    .map_err(|e| Self::map_write_error(e, title.unwrap_or_default()))
            })
            .await?;

        if result.rows_affected() == 0 {
            // Deleted between the lookup and the update.
            return Err(Self::not_found(input.id));
        }

        Ok(existing)
    }

    /// Count every row in the table, including deleted ones.
    pub async fn count_all(pool: &PgPool, ctx: &RequestContext) -> RepoResult<i64> {
        let query = format!("SELECT COUNT(*) FROM {table}", table = C::TABLE);
        ctx.run(async {
            sqlx::query_scalar::<_, i64>(&query)
                .fetch_one(pool)
                .await
                .map_err(RepoError::from)
        })
        .await
    }

    /// Whether an active item other than `exclude_id` holds `title`.
    async fn title_taken(
        pool: &PgPool,
        ctx: &RequestContext,
        title: &str,
        exclude_id: Option<DbId>,
    ) -> RepoResult<bool> {
        let query = format!(
            "SELECT EXISTS( \
                 SELECT 1 FROM {table} \
                 WHERE title = $1 AND {ACTIVE} \
                   AND ($2::BIGINT IS NULL OR id <> $2))",
            table = C::TABLE,
        );
        ctx.run(async {
            sqlx::query_scalar::<_, bool>(&query)
                .bind(title)
                .bind(exclude_id)
                .fetch_one(pool)
                .await
                .map_err(RepoError::from)
        })
        .await
    }

    fn map_write_error(err: sqlx::Error, title: &str) -> RepoError {
        if is_unique_violation(&err, C::UNIQUE_TITLE_INDEX) {
            Self::duplicate(title)
        } else {
            RepoError::Database(err)
        }
    }

    fn duplicate(title: &str) -> RepoError {
        CoreError::DuplicateTitle {
            entity: C::ENTITY,
            title: title.to_string(),
        }
        .into()
    }

    fn not_found(id: DbId) -> RepoError {
        CoreError::NotFound {
            entity: C::ENTITY,
            id,
        }
        .into()
    }
}

/// Build the `ORDER BY` clause for a find request.
///
/// Position ordering keeps rows without a position after every positioned
/// row in both directions. `id` breaks ties so pages never overlap.
fn order_clause(sort_by: SortField, order: SortOrder) -> String {
    let dir = order.as_sql();
    match sort_by {
        SortField::Position => format!("position IS NULL, position {dir}, id ASC"),
        SortField::CreatedAt => format!("created_at {dir}, id ASC"),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
