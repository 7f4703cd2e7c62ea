//! Process-wide index -> grant registry
//!
//! Concurrency model:
//! - Every writer-path operation (`load`, `save`, `create_grant`,
//!   `issue_grant`) holds `write_gate` for its whole duration, so index
//!   generation, insertion and persistence form one atomic unit.
//! - Lookups only take the shared side of `grants`. The exclusive side is
//!   held just long enough to insert or replace the in-memory map, never
//!   across file I/O.

use crate::auth::{is_well_formed, AccessGrant, PlatformId, TokenGenerator};
use crate::error::RegistryError;
use crate::storage::{GrantMap, GrantStore, StorageError};
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

pub struct GrantRegistry {
    grants: RwLock<GrantMap>,
    write_gate: Mutex<()>,
    store: Box<dyn GrantStore>,
    generator: TokenGenerator,
    /// In-memory state has changes the store does not
    dirty: AtomicBool,
}

impl GrantRegistry {
    /// Create an empty, unloaded registry
    pub fn new(store: impl GrantStore + 'static, generator: TokenGenerator) -> Self {
        Self {
            grants: RwLock::new(GrantMap::new()),
            write_gate: Mutex::new(()),
            store: Box::new(store),
            generator,
            dirty: AtomicBool::new(false),
        }
    }

    /// Create a registry and load it from the store
    ///
    /// Load failures are logged and leave the registry empty.
    pub fn open(store: impl GrantStore + 'static, generator: TokenGenerator) -> Self {
        let registry = Self::new(store, generator);
        if let Err(e) = registry.load() {
            warn!(
                store = %registry.store.describe(),
                error = %e,
                "Could not load indexes, starting with an empty registry"
            );
        }
        registry
    }

    /// Replace the in-memory mapping with the stored one
    ///
    /// A missing store yields an empty registry. An unreadable or malformed
    /// store also yields an empty registry, and the error is returned for the
    /// caller to report.
    pub fn load(&self) -> Result<usize, StorageError> {
        let _gate = self.write_gate.lock();

        let (loaded, result) = match self.store.load() {
            Ok(Some(grants)) => {
                let count = grants.len();
                info!(store = %self.store.describe(), count, "Loaded indexes");
                (grants, Ok(count))
            }
            Ok(None) => {
                info!(store = %self.store.describe(), "No index store found, it will be created on first save");
                (GrantMap::new(), Ok(0))
            }
            Err(e) => (GrantMap::new(), Err(e)),
        };

        *self.grants.write() = loaded;
        self.dirty.store(false, Ordering::SeqCst);
        result
    }

    /// Write the full mapping to the store
    ///
    /// On failure the in-memory state is kept and the registry is marked as
    /// not persisted.
    pub fn save(&self) -> Result<(), StorageError> {
        let gate = self.write_gate.lock();
        self.persist(&gate)
    }

    /// Save only if there are changes the store has not seen
    pub fn flush(&self) -> Result<(), StorageError> {
        let gate = self.write_gate.lock();
        if !self.dirty.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.persist(&gate)
    }

    /// Record a grant under a caller-chosen index
    ///
    /// Fails with `InvalidToken` unless the index is `[A-Za-z0-9]` of the
    /// configured length, and with `DuplicateToken` if it is taken; either
    /// way the registry is left unchanged. Indexes already in the store are
    /// loaded as-is. A failed save is logged and does not fail the
    /// request; check [`is_persisted`](Self::is_persisted) when durability
    /// matters.
    pub fn create_grant(
        &self,
        token: &str,
        resource_id: PlatformId,
        role_id: PlatformId,
    ) -> Result<AccessGrant, RegistryError> {
        if !is_well_formed(token, self.generator.length()) {
            warn!(token = %token, "Rejecting malformed index");
            return Err(RegistryError::InvalidToken(token.to_string()));
        }

        let gate = self.write_gate.lock();

        if self.grants.read().contains_key(token) {
            error!(token = %token, "Refusing to register an index twice");
            return Err(RegistryError::DuplicateToken(token.to_string()));
        }

        let grant = AccessGrant::new(token, resource_id, role_id);
        self.insert_and_persist(&gate, &grant);
        Ok(grant)
    }

    /// Generate a fresh index and record a grant under it
    ///
    /// Generation, insertion and persistence all happen under one held
    /// writer gate, so two concurrent calls can never receive the same index.
    pub fn issue_grant(&self, resource_id: PlatformId, role_id: PlatformId) -> AccessGrant {
        let gate = self.write_gate.lock();

        let token = {
            let grants = self.grants.read();
            self.generator.generate(|candidate| grants.contains_key(candidate))
        };

        let grant = AccessGrant::new(token, resource_id, role_id);
        self.insert_and_persist(&gate, &grant);
        grant
    }

    /// Resolve an index; exact match only
    pub fn lookup(&self, token: &str) -> Result<AccessGrant, RegistryError> {
        self.grants
            .read()
            .get(token)
            .map(|record| AccessGrant::from_record(token, record))
            .ok_or_else(|| RegistryError::TokenNotFound(token.to_string()))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.grants.read().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.grants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.read().is_empty()
    }

    /// All grants in the order they were created
    pub fn grants(&self) -> Vec<AccessGrant> {
        self.grants
            .read()
            .iter()
            .map(|(token, record)| AccessGrant::from_record(token, record))
            .collect()
    }

    /// True when the store holds everything that is in memory
    pub fn is_persisted(&self) -> bool {
        !self.dirty.load(Ordering::SeqCst)
    }

    pub fn token_length(&self) -> usize {
        self.generator.length()
    }

    /// Generate an index that is currently free without recording it
    pub fn preview_token(&self) -> String {
        let grants = self.grants.read();
        self.generator.generate(|candidate| grants.contains_key(candidate))
    }

    fn insert_and_persist(&self, gate: &MutexGuard<'_, ()>, grant: &AccessGrant) {
        self.grants.write().insert(grant.token.clone(), grant.to_record());
        debug!(
            token = %grant.token,
            channel_id = %grant.resource_id,
            role_id = %grant.role_id,
            "Registered index"
        );

        if let Err(e) = self.persist(gate) {
            error!(
                token = %grant.token,
                store = %self.store.describe(),
                error = %e,
                "Index registered in memory but could not be saved"
            );
        }
    }

    /// Requires the writer gate; the read lock keeps lookups flowing during I/O
    fn persist(&self, _gate: &MutexGuard<'_, ()>) -> Result<(), StorageError> {
        let grants = self.grants.read();
        match self.store.save(&grants) {
            Ok(()) => {
                self.dirty.store(false, Ordering::SeqCst);
                Ok(())
            }
            Err(e) => {
                self.dirty.store(true, Ordering::SeqCst);
                Err(e)
            }
        }
    }
}
