//! Default feed content inserted into empty tables on first start.
//!
//! Seeding is opt-in (`seedDefaults` in the shared config) and only touches a
//! table that has never held a row, so it never resurrects deleted content.

use discover_core::context::RequestContext;
use sqlx::PgPool;

use crate::collection::{Articles, Carousels, Collection};
use crate::error::RepoResult;
use crate::models::content::CreateContentItem;
use crate::repositories::ContentRepo;

/// Actor recorded on seeded rows.
pub const SEED_ACTOR: &str = "system";

/// `(title, image_url, link_url, position)` for the default carousels.
const DEFAULT_CAROUSELS: &[(&str, &str, &str, i32)] = &[
    (
        "Default Carousel 1",
        "https://media.istockphoto.com/id/473082752/photo.jpg",
        "https://www.facebook.com",
        1,
    ),
    (
        "Default Carousel 2",
        "https://media.istockphoto.com/id/1136116781/photo.jpg",
        "https://www.twitter.com",
        2,
    ),
    (
        "Default Carousel 3",
        "https://media.istockphoto.com/id/1148668425/photo.jpg",
        "https://www.instagram.com",
        3,
    ),
];

/// `(title, image_url, link_url, position)` for the default articles.
const DEFAULT_ARTICLES: &[(&str, &str, &str, i32)] = &[
    ("Facebook", "https://cdn-icons-png.freepik.com/256/2626/2626269.png", "https://www.facebook.com", 1),
    ("Twitter", "https://cdn-icons-png.freepik.com/256/2626/2626271.png", "https://www.twitter.com", 2),
    ("Instagram", "https://cdn-icons-png.freepik.com/256/2626/2626270.png", "https://www.instagram.com", 3),
    ("LinkedIn", "https://cdn-icons-png.freepik.com/256/2626/2626273.png", "https://www.linkedin.com", 4),
    ("YouTube", "https://cdn-icons-png.freepik.com/256/2626/2626292.png", "https://www.youtube.com", 5),
    ("Reddit", "https://cdn-icons-png.freepik.com/256/2626/2626300.png", "https://www.reddit.com", 6),
    ("Pinterest", "https://cdn-icons-png.freepik.com/256/2626/2626275.png", "https://www.pinterest.com", 7),
    ("TikTok", "https://cdn-icons-png.freepik.com/512/3046/3046121.png", "https://www.tiktok.com", 8),
    ("Snapchat", "https://cdn-icons-png.freepik.com/256/2626/2626276.png", "https://www.snapchat.com", 9),
    ("WhatsApp", "https://cdn-icons-png.freepik.com/256/2626/2626279.png", "https://www.whatsapp.com", 10),
    ("Telegram", "https://cdn-icons-png.freepik.com/256/2626/2626281.png", "https://telegram.org", 11),
    ("GitHub", "https://cdn-icons-png.freepik.com/512/2175/2175377.png", "https://github.com", 12),
    ("Stack Overflow", "https://cdn-icons-png.freepik.com/256/2626/2626299.png", "https://stackoverflow.com", 13),
    ("Medium", "https://cdn-icons-png.freepik.com/512/2504/2504925.png", "https://medium.com", 14),
    ("Netflix", "https://cdn-icons-png.freepik.com/512/2504/2504929.png", "https://www.netflix.com", 15),
    ("Amazon", "https://cdn-icons-png.freepik.com/512/14063/14063250.png", "https://www.amazon.com", 16),
    ("eBay", "https://cdn-icons-png.freepik.com/512/14083/14083029.png", "https://www.ebay.com", 17),
    ("Wikipedia", "https://cdn-icons-png.freepik.com/512/14064/14064552.png", "https://www.wikipedia.org", 18),
    ("Google", "https://cdn-icons-png.freepik.com/512/14063/14063276.png", "https://www.google.com", 19),
    ("Yahoo", "https://cdn-icons-png.freepik.com/512/2175/2175361.png", "https://www.yahoo.com", 20),
];

/// Seed both tables. Returns the number of rows inserted.
pub async fn seed_defaults(pool: &PgPool, ctx: &RequestContext) -> RepoResult<usize> {
    let carousels = seed_table::<Carousels>(pool, ctx, DEFAULT_CAROUSELS).await?;
    let articles = seed_table::<Articles>(pool, ctx, DEFAULT_ARTICLES).await?;
    Ok(carousels + articles)
}

async fn seed_table<C: Collection>(
    pool: &PgPool,
    ctx: &RequestContext,
    rows: &[(&str, &str, &str, i32)],
) -> RepoResult<usize> {
    if ContentRepo::<C>::count_all(pool, ctx).await? > 0 {
        return Ok(0);
    }

    for (title, image_url, link_url, position) in rows {
        let input = CreateContentItem {
            title: (*title).to_string(),
            image_url: (*image_url).to_string(),
            link_url: (*link_url).to_string(),
            created_by: Some(SEED_ACTOR.to_string()),
            position: Some(*position),
        };
        ContentRepo::<C>::create(pool, ctx, &input, SEED_ACTOR).await?;
    }

    tracing::info!(table = C::TABLE, rows = rows.len(), "Seeded default content");
    Ok(rows.len())
}
