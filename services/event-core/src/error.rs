//! Service-level error type
//!
//! Validation failures happen before anything is loaded. Retrieval and
//! persistence failures abort an update; transform failures never reach
//! this type.

use thiserror::Error;
use types::errors::{MergeError, ValidationError};

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to retrieve event: {0}")]
    Retrieval(#[source] StoreError),

    #[error("failed to persist event: {0}")]
    Persistence(#[source] StoreError),

    #[error("store {operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl From<MergeError> for CoreError {
    fn from(err: MergeError) -> Self {
        CoreError::Validation(ValidationError::Merge(err))
    }
}

impl CoreError {
    /// Whether the caller sent something unacceptable, as opposed to the
    /// service failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}
