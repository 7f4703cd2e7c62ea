//! JSON file storage backend
//!
//! Layout: a single object keyed by index,
//! `{"<index>": {"channel_id": ..., "role_id": ...}, ...}`.

use crate::storage::{GrantMap, GrantStore, StorageError};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed grant store
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file used for atomic replacement
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "indexes".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn encode(grants: &GrantMap) -> Result<Vec<u8>, StorageError> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        grants
            .serialize(&mut ser)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(buf)
    }
}

impl GrantStore for JsonFileStore {
    fn load(&self) -> Result<Option<GrantMap>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StorageError::Read(format!("{}: {}", self.path.display(), e)));
            }
        };

        let grants: GrantMap = serde_json::from_slice(&bytes)
            .map_err(|e| StorageError::Malformed(format!("{}: {}", self.path.display(), e)))?;

        Ok(Some(grants))
    }

    fn save(&self, grants: &GrantMap) -> Result<(), StorageError> {
        let data = Self::encode(grants)?;

        // Write to a temp file then rename so a crash never leaves half a file
        let tmp = self.temp_path();
        fs::write(&tmp, &data)
            .map_err(|e| StorageError::Write(format!("{}: {}", tmp.display(), e)))?;

        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(StorageError::Write(format!("{}: {}", self.path.display(), e)));
        }

        debug!(path = %self.path.display(), count = grants.len(), "Saved indexes");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{GrantRecord, PlatformId};

    fn record(channel: u64, role: &str) -> GrantRecord {
        GrantRecord {
            channel_id: PlatformId::Int(channel),
            role_id: role.into(),
        }
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("channel_indexes.json"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("channel_indexes.json"));

        let mut grants = GrantMap::new();
        grants.insert("zzzzzzzzzz".to_string(), record(1, "role-a"));
        grants.insert("aaaaaaaaaa".to_string(), record(2, "role-b"));
        grants.insert("mmmmmmmmmm".to_string(), record(3, "role-c"));

        store.save(&grants).unwrap();
        let loaded = store.load().unwrap().unwrap();

        assert_eq!(loaded, grants);
        // Insertion order survives the round trip
        let keys: Vec<_> = loaded.keys().cloned().collect();
        assert_eq!(keys, vec!["zzzzzzzzzz", "aaaaaaaaaa", "mmmmmmmmmm"]);
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel_indexes.json");
        let store = JsonFileStore::new(&path);

        let mut grants = GrantMap::new();
        grants.insert("aZ3kT9qLmP".to_string(), record(42, "access-general"));
        store.save(&grants).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("    \"aZ3kT9qLmP\""), "expected 4-space indent:\n{}", text);

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"aZ3kT9qLmP": {"channel_id": 42, "role_id": "access-general"}})
        );

        // Temp file does not linger
        assert!(!dir.path().join(".channel_indexes.json.tmp").exists());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("channel_indexes.json"));

        let mut first = GrantMap::new();
        first.insert("one".to_string(), record(1, "r1"));
        first.insert("two".to_string(), record(2, "r2"));
        store.save(&first).unwrap();

        let mut second = GrantMap::new();
        second.insert("three".to_string(), record(3, "r3"));
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap().unwrap(), second);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel_indexes.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed(_)));
        assert!(err.is_read_error());
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel_indexes.json");
        fs::write(&path, r#"{"abc": {"channel_id": 1}}"#).unwrap();

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed(_)));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing").join("channel_indexes.json"));

        let err = store.save(&GrantMap::new()).unwrap_err();
        assert!(matches!(err, StorageError::Write(_)));
        assert!(!err.is_read_error());
    }
}
