//! Registry error types

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Lookup of an index that was never issued
    #[error("index not found: {0}")]
    TokenNotFound(String),

    /// Caller-supplied index that is not `[A-Za-z0-9]` of the configured length
    #[error("malformed index: {0:?}")]
    InvalidToken(String),

    /// Insert of an index that is already registered
    #[error("index already registered: {0}")]
    DuplicateToken(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl RegistryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::TokenNotFound(_))
    }
}
