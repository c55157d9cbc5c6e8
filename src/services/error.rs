use thiserror::Error;

use crate::{application::error::ApplicationError, domain::config::local::Provider};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Location belongs to the {found:?} provider, this backend is {expected:?}")]
    ProviderMismatch { expected: Provider, found: Provider },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<StorageError> for ApplicationError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::NotFound(_) => ApplicationError::NotFound,
            other => ApplicationError::StorageFailure(other.to_string()),
        }
    }
}
