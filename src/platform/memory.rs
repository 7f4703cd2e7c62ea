//! In-memory platform for tests and dry runs

use crate::auth::PlatformId;
use crate::platform::{Platform, PlatformError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct State {
    next_id: u64,
    channels: Vec<(PlatformId, String)>,
    roles: Vec<(PlatformId, String)>,
    members: HashSet<PlatformId>,
    channel_roles: HashMap<PlatformId, HashSet<PlatformId>>,
    member_roles: HashMap<PlatformId, HashSet<PlatformId>>,
    messages: HashMap<PlatformId, Vec<String>>,
}

impl State {
    fn allocate(&mut self) -> PlatformId {
        self.next_id += 1;
        PlatformId::Int(self.next_id)
    }

    fn channel_by_name(&self, name: &str) -> Option<PlatformId> {
        self.channels
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id.clone())
    }

    fn has_channel(&self, id: &PlatformId) -> bool {
        self.channels.iter().any(|(c, _)| c == id)
    }

    fn has_role(&self, id: &PlatformId) -> bool {
        self.roles.iter().any(|(r, _)| r == id)
    }
}

/// A single-guild chat platform held in memory
#[derive(Default)]
pub struct InMemoryPlatform {
    state: Mutex<State>,
    fail_role_creation: AtomicBool,
    fail_role_assignment: AtomicBool,
}

impl InMemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a member, returns its ID
    pub fn add_member(&self) -> PlatformId {
        let mut state = self.state.lock();
        let id = state.allocate();
        state.members.insert(id.clone());
        id
    }

    /// ID of the named text channel, creating it if needed
    pub fn channel_id(&self, name: &str) -> PlatformId {
        let mut state = self.state.lock();
        if let Some(id) = state.channel_by_name(name) {
            return id;
        }
        let id = state.allocate();
        state.channels.push((id.clone(), name.to_string()));
        id
    }

    pub fn find_channel_by_name(&self, name: &str) -> Option<PlatformId> {
        self.state.lock().channel_by_name(name)
    }

    /// ID of the first role with this name
    pub fn role_id(&self, name: &str) -> Option<PlatformId> {
        self.state
            .lock()
            .roles
            .iter()
            .find(|(_, n)| n == name)
            .map(|(id, _)| id.clone())
    }

    pub fn channel_allows(&self, channel: &PlatformId, role: &PlatformId) -> bool {
        self.state
            .lock()
            .channel_roles
            .get(channel)
            .is_some_and(|roles| roles.contains(role))
    }

    pub fn member_has_role(&self, member: &PlatformId, role: &PlatformId) -> bool {
        self.state
            .lock()
            .member_roles
            .get(member)
            .is_some_and(|roles| roles.contains(role))
    }

    /// Messages posted to a channel, oldest first
    pub fn messages(&self, channel: &PlatformId) -> Vec<String> {
        self.state
            .lock()
            .messages
            .get(channel)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_fail_role_creation(&self, fail: bool) {
        self.fail_role_creation.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_role_assignment(&self, fail: bool) {
        self.fail_role_assignment.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Platform for InMemoryPlatform {
    async fn create_role(&self, name: &str) -> Result<PlatformId, PlatformError> {
        if self.fail_role_creation.load(Ordering::SeqCst) {
            return Err(PlatformError::Forbidden("manage roles".into()));
        }

        let mut state = self.state.lock();
        let id = state.allocate();
        state.roles.push((id.clone(), name.to_string()));
        Ok(id)
    }

    async fn allow_channel(&self, channel: &PlatformId, role: &PlatformId) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if !state.has_channel(channel) {
            return Err(PlatformError::NotFound(format!("channel {}", channel)));
        }
        if !state.has_role(role) {
            return Err(PlatformError::NotFound(format!("role {}", role)));
        }

        state
            .channel_roles
            .entry(channel.clone())
            .or_default()
            .insert(role.clone());
        Ok(())
    }

    async fn add_member_role(&self, member: &PlatformId, role: &PlatformId) -> Result<(), PlatformError> {
        if self.fail_role_assignment.load(Ordering::SeqCst) {
            return Err(PlatformError::Forbidden("manage roles".into()));
        }

        let mut state = self.state.lock();
        if !state.members.contains(member) {
            return Err(PlatformError::NotFound(format!("member {}", member)));
        }
        if !state.has_role(role) {
            return Err(PlatformError::NotFound(format!("role {}", role)));
        }

        state
            .member_roles
            .entry(member.clone())
            .or_default()
            .insert(role.clone());
        Ok(())
    }

    async fn find_text_channel(&self, name: &str) -> Result<Option<PlatformId>, PlatformError> {
        Ok(self.state.lock().channel_by_name(name))
    }

    async fn create_text_channel(&self, name: &str) -> Result<PlatformId, PlatformError> {
        Ok(self.channel_id(name))
    }

    async fn send_message(&self, channel: &PlatformId, content: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock();
        if !state.has_channel(channel) {
            return Err(PlatformError::NotFound(format!("channel {}", channel)));
        }

        state
            .messages
            .entry(channel.clone())
            .or_default()
            .push(content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_role_assignment_requires_known_role() {
        let platform = InMemoryPlatform::new();
        let member = platform.add_member();

        let err = platform
            .add_member_role(&member, &PlatformId::Int(999))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NotFound(_)));

        let role = platform.create_role("access-general").await.unwrap();
        platform.add_member_role(&member, &role).await.unwrap();
        assert!(platform.member_has_role(&member, &role));
    }

    #[tokio::test]
    async fn test_channel_lookup_by_name() {
        let platform = InMemoryPlatform::new();
        assert!(platform.find_text_channel("index-log").await.unwrap().is_none());

        let id = platform.create_text_channel("index-log").await.unwrap();
        assert_eq!(platform.find_text_channel("index-log").await.unwrap(), Some(id.clone()));

        platform.send_message(&id, "hello").await.unwrap();
        assert_eq!(platform.messages(&id), vec!["hello".to_string()]);
    }

    #[test]
    fn test_default_mentions() {
        let platform = InMemoryPlatform::new();
        assert_eq!(platform.mention_channel(&PlatformId::Int(5)), "<#5>");
        assert_eq!(platform.mention_role(&PlatformId::Int(6)), "<@&6>");
    }
}
