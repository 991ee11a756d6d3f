use std::marker::PhantomData;

use discover_core::content::{
    resolve_actor, validate_item_id, validate_new_item, FindParams, FindQuery,
};
use discover_core::context::RequestContext;
use discover_core::error::CoreError;
use discover_db::collection::Collection;
use discover_db::models::content::{
    ContentItem, CreateContentItem, DeleteContentItem, UpdateContentItem,
};
use discover_db::repositories::ContentRepo;
use discover_db::{DbPool, RepoError, RepoResult};

/// Find, create, delete and edit for one content collection.
#[derive(Debug, Clone)]
pub struct ContentUseCase<C> {
    pool: DbPool,
    collection: PhantomData<C>,
}

impl<C: Collection> ContentUseCase<C> {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            collection: PhantomData,
        }
    }

    /// One page of active items and the size of the filtered set.
    ///
    /// An empty filtered set is reported as `NotFound`, which is an expected
    /// outcome and is logged at debug level only.
    #[tracing::instrument(
        skip_all,
        fields(
            entity = C::ENTITY,
            op = %ctx.operation_id(),
            page = tracing::field::Empty,
            limit = tracing::field::Empty
        )
    )]
    pub async fn find(
        &self,
        ctx: &RequestContext,
        params: &FindParams,
    ) -> RepoResult<(Vec<ContentItem<C>>, i64)> {
        let query = FindQuery::parse(params)?;
        tracing::Span::current()
            .record("page", query.page)
            .record("limit", query.limit);

        let result = ContentRepo::<C>::find(&self.pool, ctx, &query).await;
        match &result {
            Ok((items, total)) => tracing::debug!(returned = items.len(), total, "Find completed"),
            Err(RepoError::Core(CoreError::NotFound { .. })) => tracing::debug!("No matching items"),
            Err(err) => tracing::error!(error = %err, "Find failed"),
        }
        result
    }

    #[tracing::instrument(
        skip_all,
        fields(entity = C::ENTITY, op = %ctx.operation_id(), title = %input.title),
        err
    )]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        input: &CreateContentItem,
    ) -> RepoResult<ContentItem<C>> {
        validate_new_item(&input.title, &input.image_url, &input.link_url)?;
        let actor = resolve_actor(input.created_by.as_deref(), ctx.operator())?;

        let item = ContentRepo::<C>::create(&self.pool, ctx, input, &actor).await?;
        tracing::info!(id = item.id, actor = %actor, "Content item created");
        Ok(item)
    }

    #[tracing::instrument(
        skip_all,
        fields(entity = C::ENTITY, op = %ctx.operation_id(), id = input.id),
        err
    )]
    pub async fn delete(&self, ctx: &RequestContext, input: &DeleteContentItem) -> RepoResult<()> {
        validate_item_id(input.id)?;
        let actor = resolve_actor(input.deleted_by.as_deref(), ctx.operator())?;

        ContentRepo::<C>::delete(&self.pool, ctx, input.id, &actor).await?;
        tracing::info!(actor = %actor, "Content item deleted");
        Ok(())
    }

    /// Apply a partial update and return the item as it was before it.
    #[tracing::instrument(
        skip_all,
        fields(entity = C::ENTITY, op = %ctx.operation_id(), id = input.id),
        err
    )]
    pub async fn edit(
        &self,
        ctx: &RequestContext,
        input: &UpdateContentItem,
    ) -> RepoResult<ContentItem<C>> {
        validate_item_id(input.id)?;
        let actor = resolve_actor(input.updated_by.as_deref(), ctx.operator())?;

        let snapshot = ContentRepo::<C>::edit(&self.pool, ctx, input, &actor).await?;
        tracing::info!(actor = %actor, "Content item updated");
        Ok(snapshot)
    }
}
