//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod content_repo;

pub use content_repo::ContentRepo;

use crate::collection::{Articles, Carousels};

/// Repository over the `articles` table.
pub type ArticleRepo = ContentRepo<Articles>;

/// Repository over the `carousels` table.
pub type CarouselRepo = ContentRepo<Carousels>;
