use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Duplicate title: an active {entity} titled '{title}' already exists")]
    DuplicateTitle { entity: &'static str, title: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Internal error: {0}")]
    Internal(String),
}
