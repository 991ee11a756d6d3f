//! Domain building blocks for the discover content service.
//!
//! Pure types and validation only: no database or HTTP code lives here.

pub mod content;
pub mod context;
pub mod error;
pub mod types;
