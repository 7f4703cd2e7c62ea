//! In-memory grant store

use crate::storage::{GrantMap, GrantStore, StorageError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Grant store kept in process memory
///
/// Reads and writes can be made to fail on demand, which is how the
/// registry's recovery paths are exercised without touching the filesystem.
#[derive(Default)]
pub struct MemoryStore {
    /// Last saved mapping, `None` until the first save
    grants: RwLock<Option<GrantMap>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    saves: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing stored mapping
    pub fn with_grants(grants: GrantMap) -> Self {
        let store = Self::new();
        *store.grants.write() = Some(grants);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the last successfully saved mapping
    pub fn snapshot(&self) -> Option<GrantMap> {
        self.grants.read().clone()
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl GrantStore for MemoryStore {
    fn load(&self) -> Result<Option<GrantMap>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Malformed("memory store: injected read failure".into()));
        }
        Ok(self.grants.read().clone())
    }

    fn save(&self, grants: &GrantMap) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write("memory store: injected write failure".into()));
        }
        *self.grants.write() = Some(grants.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
