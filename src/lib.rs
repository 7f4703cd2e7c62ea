//! Indexgate - index-gated channel access for chat communities
//!
//! An administrator turns a channel into a gated resource by minting a short
//! random index and a dedicated role. Members who later present the index
//! receive the role and with it access to the channel.
//!
//! The [`GrantRegistry`] owns the index -> grant mapping and its on-disk
//! copy; [`platform::IndexCommands`] wires it to a chat service.

pub mod auth;
pub mod config;
pub mod error;
pub mod platform;
pub mod registry;
pub mod storage;

pub use auth::{AccessGrant, PlatformId, TokenGenerator};
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use registry::GrantRegistry;
pub use storage::{GrantStore, JsonFileStore, MemoryStore, StorageError};
