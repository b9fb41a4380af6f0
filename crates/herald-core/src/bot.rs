//! Bot trait and identity lookups.
//!
//! A [`Bot`] is the outbound half of a transport: it sends text back to the
//! platform and exposes a [`Directory`] through which guild membership is
//! resolved. Lookups are synchronous; transports are expected to answer them
//! from their local cache.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};
use crate::event::ChatEvent;
use crate::id::{GuildId, RoleId, UserId};

// =============================================================================
// Identity
// =============================================================================

/// A guild member as seen by the permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// The member's user id.
    pub user: UserId,
    /// Roles held by the member in the guild.
    pub roles: Vec<RoleId>,
    /// Whether the member owns the guild.
    pub is_owner: bool,
    /// Whether the member holds an administrator role.
    pub is_administrator: bool,
}

impl Member {
    /// Creates a member with no roles or privileges.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            roles: Vec::new(),
            is_owner: false,
            is_administrator: false,
        }
    }

    /// Adds a role.
    pub fn with_role(mut self, role: RoleId) -> Self {
        self.roles.push(role);
        self
    }

    /// Marks the member as the guild owner.
    pub fn owner(mut self) -> Self {
        self.is_owner = true;
        self
    }

    /// Marks the member as an administrator.
    pub fn administrator(mut self) -> Self {
        self.is_administrator = true;
        self
    }

    /// Returns true if the member holds `role`.
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }

    /// Owners and administrators bypass every permission rule.
    pub fn is_privileged(&self) -> bool {
        self.is_owner || self.is_administrator
    }
}

/// Read access to guild membership and roles.
pub trait Directory: Send + Sync {
    /// The owner of `guild`, if known.
    fn guild_owner(&self, guild: GuildId) -> Option<UserId>;

    /// Roles `user` holds in `guild`, excluding the implicit everyone role.
    fn member_roles(&self, guild: GuildId, user: UserId) -> Vec<RoleId>;

    /// Whether `user` holds a role with administrator rights in `guild`.
    fn is_administrator(&self, guild: GuildId, user: UserId) -> bool;

    /// The role every member of `guild` implicitly holds.
    fn everyone_role(&self, guild: GuildId) -> RoleId;

    /// Display name of a role.
    fn role_name(&self, _role: RoleId) -> Option<String> {
        None
    }

    /// Resolves the full member view used by permission checks.
    ///
    /// The everyone role is always included.
    fn member(&self, guild: GuildId, user: UserId) -> Member {
        let mut roles = self.member_roles(guild, user);
        let everyone = self.everyone_role(guild);
        if !roles.contains(&everyone) {
            roles.push(everyone);
        }
        Member {
            user,
            roles,
            is_owner: self.guild_owner(guild) == Some(user),
            is_administrator: self.is_administrator(guild, user),
        }
    }
}

// =============================================================================
// Bot
// =============================================================================

/// The outbound side of a chat transport.
#[async_trait]
pub trait Bot: Send + Sync + 'static {
    /// Returns the bot's unique identifier.
    fn id(&self) -> &str;

    /// Sends a message to the channel the event came from.
    ///
    /// Returns the platform message id if successful.
    async fn send(&self, event: &dyn ChatEvent, message: &str) -> ApiResult<String>;

    /// Sends a private message to the author of the event.
    ///
    /// The default implementation answers in the originating channel.
    async fn send_private(&self, event: &dyn ChatEvent, message: &str) -> ApiResult<String> {
        self.send(event, message).await
    }

    /// Deletes a message in the channel the event came from.
    ///
    /// `message_id` is an id returned by [`send`](Self::send) or the event's
    /// own [`ChatEvent::message_id`]. Transports that cannot delete messages
    /// keep the default, which reports the call as unsupported.
    async fn delete_message(&self, _event: &dyn ChatEvent, _message_id: &str) -> ApiResult<()> {
        Err(ApiError::Unsupported("deleting messages"))
    }

    /// Identity lookups for guilds this bot can see.
    fn directory(&self) -> &dyn Directory;
}

/// A shared Bot trait object.
pub type BoxedBot = Arc<dyn Bot>;
