//! Integration tests for default content seeding and schema bootstrap.

use discover_core::content::FindQuery;
use discover_core::context::RequestContext;
use discover_db::repositories::{ArticleRepo, CarouselRepo};
use discover_db::seed::{seed_defaults, SEED_ACTOR};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seed_fills_empty_tables(pool: PgPool) {
    let ctx = RequestContext::background();
    let inserted = seed_defaults(&pool, &ctx).await.unwrap();
    assert_eq!(inserted, 23);

    let (carousels, total) = CarouselRepo::find(&pool, &ctx, &FindQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(carousels[0].title, "Default Carousel 1");
    assert_eq!(carousels[0].created_by, SEED_ACTOR);

    let (articles, total) = ArticleRepo::find(&pool, &ctx, &FindQuery::default())
        .await
        .unwrap();
    assert_eq!(total, 20);
    assert_eq!(articles[0].title, "Facebook");
    assert_eq!(articles[0].position, Some(1));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_seed_is_skipped_for_non_empty_tables(pool: PgPool) {
    let ctx = RequestContext::background();
    seed_defaults(&pool, &ctx).await.unwrap();

    let again = seed_defaults(&pool, &ctx).await.unwrap();
    assert_eq!(again, 0);
    assert_eq!(ArticleRepo::count_all(&pool, &ctx).await.unwrap(), 20);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_migrations_are_idempotent(pool: PgPool) {
    discover_db::run_migrations(&pool).await.unwrap();
    discover_db::run_migrations(&pool).await.unwrap();
    discover_db::health_check(&pool).await.unwrap();
}
