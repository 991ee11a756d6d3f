//! Use cases sit between the HTTP handlers and the repositories.
//!
//! They validate requests, resolve the acting user, and open one tracing span
//! per operation.

pub mod content;
pub mod health;

use discover_db::collection::{Articles, Carousels, Collection};
use discover_db::DbPool;

pub use content::ContentUseCase;
pub use health::HealthUseCase;

/// Every use case the service exposes.
#[derive(Debug, Clone)]
pub struct UseCases {
    pub health: HealthUseCase,
    pub articles: ContentUseCase<Articles>,
    pub carousels: ContentUseCase<Carousels>,
}

impl UseCases {
    pub fn new(pool: DbPool) -> Self {
        Self {
            health: HealthUseCase::new(pool.clone()),
            articles: ContentUseCase::new(pool.clone()),
            carousels: ContentUseCase::new(pool),
        }
    }
}

/// A collection with a use case in [`UseCases`], so generic handlers can be
/// mounted once per collection.
pub trait HasUseCase: Collection {
    fn use_case(usecases: &UseCases) -> &ContentUseCase<Self>;
}

impl HasUseCase for Articles {
    fn use_case(usecases: &UseCases) -> &ContentUseCase<Self> {
        &usecases.articles
    }
}

impl HasUseCase for Carousels {
    fn use_case(usecases: &UseCases) -> &ContentUseCase<Self> {
        &usecases.carousels
    }
}
