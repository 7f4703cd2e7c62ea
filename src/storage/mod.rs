//! Backing stores for the index registry
//!
//! - JSON file: durable store, rewritten wholesale on every mutation
//! - Memory: in-process store for tests and dry runs

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::auth::GrantRecord;
use indexmap::IndexMap;
use thiserror::Error;

/// Insertion-ordered mapping from index to grant record
pub type GrantMap = IndexMap<String, GrantRecord>;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("failed to read {0}")]
    Read(String),

    #[error("malformed index store: {0}")]
    Malformed(String),

    #[error("failed to write {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// True for failures that happened while loading the store
    pub fn is_read_error(&self) -> bool {
        matches!(self, StorageError::Read(_) | StorageError::Malformed(_))
    }
}

/// Trait for the durable side of the registry
///
/// Implementations only ever see the full mapping: `load` returns all of it,
/// `save` replaces all of it.
pub trait GrantStore: Send + Sync {
    /// Read the full mapping; `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<GrantMap>, StorageError>;

    /// Overwrite the stored mapping
    fn save(&self, grants: &GrantMap) -> Result<(), StorageError>;

    /// Short label for diagnostics
    fn describe(&self) -> String;
}

impl<S: GrantStore + ?Sized> GrantStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<GrantMap>, StorageError> {
        (**self).load()
    }

    fn save(&self, grants: &GrantMap) -> Result<(), StorageError> {
        (**self).save(grants)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
