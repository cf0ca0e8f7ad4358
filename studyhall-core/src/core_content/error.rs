//! Error taxonomy for content operations

use crate::core_model::IntegrityError;
use thiserror::Error;

/// Every failure a content operation can surface to its caller
///
/// Validation and authorization failures are detected before any persistence
/// attempt. `PartialWrite` is only raised after the documented compensation
/// has run; callers never observe the intermediate partial state.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("exhausted retry budget generating a unique code")]
    CodeGenerationExhausted,

    #[error("the assignment's due date has passed")]
    SubmissionWindowClosed,

    #[error("multi-entity write failed after compensation: {0}")]
    PartialWrite(String),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("file store error: {0}")]
    FileStore(String),
}

impl From<rusqlite::Error> for ContentError {
    fn from(e: rusqlite::Error) -> Self {
        ContentError::Storage(e.to_string())
    }
}

impl From<r2d2::Error> for ContentError {
    fn from(e: r2d2::Error) -> Self {
        ContentError::Storage(format!("connection pool: {}", e))
    }
}
