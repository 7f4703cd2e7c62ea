//! Registry configuration

use crate::auth::{TokenError, TokenGenerator, DEFAULT_TOKEN_LENGTH};
use crate::registry::GrantRegistry;
use crate::storage::JsonFileStore;
use std::path::PathBuf;

/// Default index file, relative to the working directory
pub const DEFAULT_INDEX_FILE: &str = "channel_indexes.json";

/// Default name of the text channel that records issued indexes
pub const DEFAULT_LOG_CHANNEL: &str = "index-log";

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Path of the JSON index file
    pub index_file: PathBuf,

    /// Length of generated indexes
    pub token_length: usize,

    /// Text channel where new indexes are announced
    pub log_channel_name: String,
}

impl RegistryConfig {
    /// Read `INDEXGATE_INDEX_FILE`, `INDEXGATE_TOKEN_LENGTH` and
    /// `INDEXGATE_LOG_CHANNEL`, falling back to defaults for anything unset or
    /// unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            index_file: std::env::var("INDEXGATE_INDEX_FILE")
                .ok()
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.index_file),
            token_length: std::env::var("INDEXGATE_TOKEN_LENGTH")
                .ok()
                .and_then(|l| l.parse().ok())
                .filter(|l| *l > 0)
                .unwrap_or(defaults.token_length),
            log_channel_name: std::env::var("INDEXGATE_LOG_CHANNEL")
                .ok()
                .filter(|n| !n.is_empty())
                .unwrap_or(defaults.log_channel_name),
        }
    }

    pub fn index_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_file = path.into();
        self
    }

    pub fn token_length(mut self, length: usize) -> Self {
        self.token_length = length;
        self
    }

    pub fn log_channel_name(mut self, name: impl Into<String>) -> Self {
        self.log_channel_name = name.into();
        self
    }

    /// Build the file-backed registry and load it
    pub fn open_registry(&self) -> Result<GrantRegistry, TokenError> {
        let generator = TokenGenerator::new(self.token_length)?;
        let store = JsonFileStore::new(&self.index_file);
        Ok(GrantRegistry::open(store, generator))
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
            token_length: DEFAULT_TOKEN_LENGTH,
            log_channel_name: DEFAULT_LOG_CHANNEL.to_string(),
        }
    }
}
