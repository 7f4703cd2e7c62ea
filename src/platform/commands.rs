//! `/setindex` and `/join` command handlers

use crate::auth::{AccessGrant, PlatformId};
use crate::platform::{Platform, PlatformError};
use crate::registry::GrantRegistry;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

pub const NO_PERMISSION: &str = "You do not have permission to run this command.";
pub const INVALID_INDEX: &str = "Invalid index!";
pub const SET_INDEX_FAILED: &str = "Something went wrong while setting up the index. Please try again.";
pub const JOIN_FAILED: &str = "Something went wrong while granting access. Please try again.";

/// What the platform asserts about a command invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Member who ran the command
    pub member_id: PlatformId,
    /// Whether the member holds administrator rights
    pub is_admin: bool,
    /// Channel the command was run in
    pub channel_id: PlatformId,
    pub channel_name: String,
}

/// Response to render back to the member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Only visible to the invoking member
    pub ephemeral: bool,
}

impl Reply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[derive(Debug, Error)]
enum CommandError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("registry task failed: {0}")]
    Registry(String),
}

/// Command handlers backed by the grant registry
#[derive(Clone)]
pub struct IndexCommands {
    registry: Arc<GrantRegistry>,
    platform: Arc<dyn Platform>,
    log_channel_name: String,
}

impl IndexCommands {
    pub fn new(
        registry: Arc<GrantRegistry>,
        platform: Arc<dyn Platform>,
        log_channel_name: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            platform,
            log_channel_name: log_channel_name.into(),
        }
    }

    pub fn registry(&self) -> &Arc<GrantRegistry> {
        &self.registry
    }

    /// Make sure the index log channel exists, creating it if needed
    ///
    /// Failures are logged; the bot keeps running without a log channel.
    pub async fn on_ready(&self) -> Option<PlatformId> {
        match self.platform.find_text_channel(&self.log_channel_name).await {
            Ok(Some(id)) => return Some(id),
            Ok(None) => {}
            Err(e) => {
                warn!(channel = %self.log_channel_name, error = %e, "Failed to look up log channel");
                return None;
            }
        }

        match self.platform.create_text_channel(&self.log_channel_name).await {
            Ok(id) => {
                info!(channel = %self.log_channel_name, "Created log channel");
                Some(id)
            }
            Err(e) => {
                error!(channel = %self.log_channel_name, error = %e, "Failed to create log channel");
                None
            }
        }
    }

    /// Gate the invoking channel behind a fresh index (administrators only)
    pub async fn set_index(&self, invocation: &Invocation) -> Reply {
        if !invocation.is_admin {
            warn!(member = %invocation.member_id, "Non-admin attempted /setindex");
            return Reply::ephemeral(NO_PERMISSION);
        }

        let role_name = format!("access-{}", invocation.channel_name);

        match self.gate_channel(invocation, &role_name).await {
            Ok(grant) => Reply::ephemeral(format!(
                "Index {} assigned to channel {}. Role {} created.",
                grant.token, invocation.channel_name, role_name
            )),
            Err(e) => {
                error!(
                    channel = %invocation.channel_id,
                    role = %role_name,
                    error = %e,
                    "Failed to set index"
                );
                Reply::ephemeral(SET_INDEX_FAILED)
            }
        }
    }

    /// Give the invoking member the role behind `index`
    pub async fn join(&self, invocation: &Invocation, index: &str) -> Reply {
        let grant = match self.registry.lookup(index) {
            Ok(grant) => grant,
            Err(_) => return Reply::ephemeral(INVALID_INDEX),
        };

        match self
            .platform
            .add_member_role(&invocation.member_id, &grant.role_id)
            .await
        {
            Ok(()) => {
                info!(member = %invocation.member_id, token = %grant.token, "Granted channel access");
                Reply::ephemeral(format!(
                    "Access granted! You now have access to the channel with index {}.",
                    grant.token
                ))
            }
            Err(e) => {
                error!(
                    member = %invocation.member_id,
                    role = %grant.role_id,
                    error = %e,
                    "Failed to add role"
                );
                Reply::ephemeral(JOIN_FAILED)
            }
        }
    }

    async fn gate_channel(&self, invocation: &Invocation, role_name: &str) -> Result<AccessGrant, CommandError> {
        let role_id = self.platform.create_role(role_name).await?;
        self.platform
            .allow_channel(&invocation.channel_id, &role_id)
            .await?;

        // The registry writes its file synchronously
        let registry = self.registry.clone();
        let channel_id = invocation.channel_id.clone();
        let grant = tokio::task::spawn_blocking(move || registry.issue_grant(channel_id, role_id))
            .await
            .map_err(|e| CommandError::Registry(e.to_string()))?;

        info!(token = %grant.token, channel = %grant.resource_id, role = %grant.role_id, "Issued index");
        self.announce(&grant).await;

        Ok(grant)
    }

    /// Post the new index to the log channel, if there is one
    async fn announce(&self, grant: &AccessGrant) {
        let log_channel = match self.platform.find_text_channel(&self.log_channel_name).await {
            Ok(Some(id)) => id,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to look up log channel");
                return;
            }
        };

        let message = format!(
            "Index {} assigned to channel {}. Role {} created.",
            grant.token,
            self.platform.mention_channel(&grant.resource_id),
            self.platform.mention_role(&grant.role_id),
        );

        if let Err(e) = self.platform.send_message(&log_channel, &message).await {
            warn!(error = %e, "Failed to post to log channel");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenGenerator;
    use crate::platform::InMemoryPlatform;
    use crate::storage::MemoryStore;

    fn setup() -> (IndexCommands, Arc<InMemoryPlatform>) {
        let registry = Arc::new(GrantRegistry::open(MemoryStore::new(), TokenGenerator::default()));
        let platform = Arc::new(InMemoryPlatform::new());
        let commands = IndexCommands::new(registry, platform.clone(), "index-log");
        (commands, platform)
    }

    fn invocation(platform: &InMemoryPlatform, admin: bool) -> Invocation {
        Invocation {
            member_id: platform.add_member(),
            is_admin: admin,
            channel_id: platform.channel_id("general"),
            channel_name: "general".to_string(),
        }
    }

    #[tokio::test]
    async fn test_on_ready_creates_log_channel_once() {
        let (commands, platform) = setup();

        let first = commands.on_ready().await.unwrap();
        let second = commands.on_ready().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(platform.find_channel_by_name("index-log"), Some(first));
    }

    #[tokio::test]
    async fn test_set_index_requires_admin() {
        let (commands, platform) = setup();
        let inv = invocation(&platform, false);

        let reply = commands.set_index(&inv).await;
        assert_eq!(reply, Reply::ephemeral(NO_PERMISSION));
        assert!(commands.registry().is_empty());
        assert!(platform.role_id("access-general").is_none());
    }

    #[tokio::test]
    async fn test_set_index_then_join() {
        let (commands, platform) = setup();
        let log_channel = commands.on_ready().await.unwrap();
        let admin = invocation(&platform, true);

        let reply = commands.set_index(&admin).await;
        assert!(reply.ephemeral);

        let grant = commands.registry().grants().pop().unwrap();
        assert_eq!(
            reply.content,
            format!("Index {} assigned to channel general. Role access-general created.", grant.token)
        );

        let role = platform.role_id("access-general").unwrap();
        assert_eq!(grant.role_id, role);
        assert!(platform.channel_allows(&admin.channel_id, &role));

        let log = platform.messages(&log_channel);
        assert_eq!(log.len(), 1);
        assert!(log[0].contains(&grant.token));

        let member = invocation(&platform, false);
        let reply = commands.join(&member, &grant.token).await;
        assert!(reply.content.starts_with("Access granted!"));
        assert!(platform.member_has_role(&member.member_id, &role));
    }

    #[tokio::test]
    async fn test_join_invalid_index() {
        let (commands, platform) = setup();
        let member = invocation(&platform, false);

        let reply = commands.join(&member, "bogus").await;
        assert_eq!(reply, Reply::ephemeral(INVALID_INDEX));
    }

    #[tokio::test]
    async fn test_set_index_platform_failure_is_generic() {
        let (commands, platform) = setup();
        platform.set_fail_role_creation(true);

        let reply = commands.set_index(&invocation(&platform, true)).await;
        assert_eq!(reply, Reply::ephemeral(SET_INDEX_FAILED));
        assert!(commands.registry().is_empty());
    }

    #[tokio::test]
    async fn test_join_platform_failure_is_generic() {
        let (commands, platform) = setup();
        commands.set_index(&invocation(&platform, true)).await;
        let grant = commands.registry().grants().pop().unwrap();

        platform.set_fail_role_assignment(true);
        let member = invocation(&platform, false);
        let reply = commands.join(&member, &grant.token).await;

        assert_eq!(reply, Reply::ephemeral(JOIN_FAILED));
        assert!(!platform.member_has_role(&member.member_id, &grant.role_id));
    }

    #[tokio::test]
    async fn test_set_index_without_log_channel() {
        let (commands, platform) = setup();

        let reply = commands.set_index(&invocation(&platform, true)).await;
        assert!(reply.content.starts_with("Index "));
        assert_eq!(commands.registry().len(), 1);
    }
}
