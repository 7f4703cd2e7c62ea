//! Chat platform integration
//!
//! The registry never talks to the chat service directly. Command handlers
//! in [`IndexCommands`] drive a [`Platform`] implementation for the actual
//! side effects: creating roles, opening channels to them, and handing roles
//! to members.

mod commands;
mod memory;

pub use commands::{IndexCommands, Invocation, Reply};
pub use memory::InMemoryPlatform;

use crate::auth::PlatformId;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("missing permissions: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("platform request failed: {0}")]
    Request(String),
}

/// Operations the command layer needs from the chat service
#[async_trait]
pub trait Platform: Send + Sync {
    /// Create a permission role, returns its ID
    async fn create_role(&self, name: &str) -> Result<PlatformId, PlatformError>;

    /// Let holders of `role` read and send messages in `channel`
    async fn allow_channel(&self, channel: &PlatformId, role: &PlatformId) -> Result<(), PlatformError>;

    /// Give `role` to a member
    async fn add_member_role(&self, member: &PlatformId, role: &PlatformId) -> Result<(), PlatformError>;

    /// Find a text channel by name
    async fn find_text_channel(&self, name: &str) -> Result<Option<PlatformId>, PlatformError>;

    /// Create a text channel, returns its ID
    async fn create_text_channel(&self, name: &str) -> Result<PlatformId, PlatformError>;

    /// Post a message to a channel
    async fn send_message(&self, channel: &PlatformId, content: &str) -> Result<(), PlatformError>;

    /// Render a clickable channel reference
    fn mention_channel(&self, channel: &PlatformId) -> String {
        format!("<#{}>", channel)
    }

    /// Render a clickable role reference
    fn mention_role(&self, role: &PlatformId) -> String {
        format!("<@&{}>", role)
    }
}
