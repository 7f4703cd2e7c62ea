//! Index tokens and the grants they unlock
//!
//! - `tokens`: random `[A-Za-z0-9]` index generation
//! - `grants`: the token -> (channel, role) record

mod grants;
mod tokens;

pub use grants::{AccessGrant, GrantRecord, PlatformId};
pub use tokens::{is_well_formed, TokenError, TokenGenerator, DEFAULT_TOKEN_LENGTH};
