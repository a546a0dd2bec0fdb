use thiserror::Error;

/// Backend-agnostic storage failure. Backends convert their driver errors into this type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record already exists: {0}")]
    Duplicate(String),
}
