//! Access grants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of an entity (channel, role, member) on the chat platform
///
/// Platforms hand out either numeric snowflakes or opaque strings, and the
/// index file stores whichever form it was given. Any JSON integer in the
/// u64 or i64 range is accepted so a single odd value cannot make the whole
/// file unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlatformId {
    Int(u64),
    Neg(i64),
    Str(String),
}

impl PlatformId {
    /// Parse from text
    ///
    /// Text becomes a number only when it is the canonical decimal form of
    /// that number, so `"007"` or `"+5"` stay strings and display unchanged.
    pub fn parse(s: &str) -> Self {
        if let Ok(n) = s.parse::<u64>() {
            if n.to_string() == s {
                return PlatformId::Int(n);
            }
        }
        if let Ok(n) = s.parse::<i64>() {
            if n < 0 && n.to_string() == s {
                return PlatformId::Neg(n);
            }
        }
        PlatformId::Str(s.to_string())
    }
}

impl FromStr for PlatformId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<u64> for PlatformId {
    fn from(id: u64) -> Self {
        PlatformId::Int(id)
    }
}

impl From<&str> for PlatformId {
    fn from(id: &str) -> Self {
        PlatformId::Str(id.to_string())
    }
}

impl From<String> for PlatformId {
    fn from(id: String) -> Self {
        PlatformId::Str(id)
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformId::Int(n) => write!(f, "{}", n),
            PlatformId::Neg(n) => write!(f, "{}", n),
            PlatformId::Str(s) => write!(f, "{}", s),
        }
    }
}

/// The value persisted under each index in the backing store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantRecord {
    pub channel_id: PlatformId,
    pub role_id: PlatformId,
}

/// One administrator-issued access right: holding `role_id` unlocks `resource_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub token: String,
    pub resource_id: PlatformId,
    pub role_id: PlatformId,
}

impl AccessGrant {
    pub fn new(token: impl Into<String>, resource_id: PlatformId, role_id: PlatformId) -> Self {
        Self {
            token: token.into(),
            resource_id,
            role_id,
        }
    }

    pub(crate) fn from_record(token: &str, record: &GrantRecord) -> Self {
        Self {
            token: token.to_string(),
            resource_id: record.channel_id.clone(),
            role_id: record.role_id.clone(),
        }
    }

    pub(crate) fn to_record(&self) -> GrantRecord {
        GrantRecord {
            channel_id: self.resource_id.clone(),
            role_id: self.role_id.clone(),
        }
    }
}

impl fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> channel {} via role {}",
            self.token, self.resource_id, self.role_id
        )
    }
}
