//! Error taxonomy for the signaling coordinator

use crate::core_content::ContentError;
use thiserror::Error;

/// Failures returned to the originating signaling client only; none of them
/// affect other rooms or take the coordinator down
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("client connection is closed")]
    Closed,

    #[error(transparent)]
    Content(ContentError),
}

impl From<ContentError> for SignalError {
    fn from(e: ContentError) -> Self {
        match e {
            ContentError::Validation(msg) => SignalError::BadRequest(msg),
            ContentError::Forbidden(what) => SignalError::Forbidden(what.to_string()),
            ContentError::NotFound(what) => SignalError::NotFound(what.to_string()),
            other => SignalError::Content(other),
        }
    }
}
