//! Collection markers for the two content tables.
//!
//! Articles and carousels share one row shape and one repository; a marker
//! type selects the backing table so a repository typed for one collection
//! can only ever read and write that collection's rows.

use std::fmt::Debug;

/// A content collection backed by its own table.
pub trait Collection: Debug + Clone + Copy + Send + Sync + 'static {
    /// Table holding the collection's rows.
    const TABLE: &'static str;
    /// Singular label used in error messages and logs.
    const ENTITY: &'static str;
    /// Partial unique index on `title` over active rows.
    const UNIQUE_TITLE_INDEX: &'static str;
}

/// The `articles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Articles;

impl Collection for Articles {
    const TABLE: &'static str = "articles";
    const ENTITY: &'static str = "article";
    const UNIQUE_TITLE_INDEX: &'static str = "uq_articles_active_title";
}

/// The `carousels` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Carousels;

impl Collection for Carousels {
    const TABLE: &'static str = "carousels";
    const ENTITY: &'static str = "carousel";
    const UNIQUE_TITLE_INDEX: &'static str = "uq_carousels_active_title";
}
