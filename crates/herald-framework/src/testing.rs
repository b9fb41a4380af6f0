//! In-memory bot, event and directory used by unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use herald_core::{
    ApiResult, Bot, BoxedBot, BoxedEvent, ChannelId, ChatEvent, Directory, GuildId, RoleId, UserId,
};
use parking_lot::Mutex;

use crate::activity::CommandContext;
use crate::error::ActivityResult;

pub const GUILD: GuildId = GuildId::new(100);
pub const OWNER: UserId = UserId::new(1);
pub const ADMIN: UserId = UserId::new(2);
pub const MEMBER: UserId = UserId::new(3);
pub const MODERATOR: UserId = UserId::new(4);
pub const EVERYONE: RoleId = RoleId::new(100);
pub const MODERATORS: RoleId = RoleId::new(50);

/// Message id carried by every [`MockEvent`] unless cleared.
pub const COMMAND_MESSAGE: &str = "command";

pub struct MockEvent {
    pub text: String,
    pub author: UserId,
    pub author_is_bot: bool,
    pub guild: Option<GuildId>,
    pub message_id: Option<String>,
}

impl MockEvent {
    pub fn new(author: UserId, text: &str) -> Self {
        Self {
            text: text.to_string(),
            author,
            author_is_bot: false,
            guild: Some(GUILD),
            message_id: Some(COMMAND_MESSAGE.to_string()),
        }
    }

    pub fn direct(mut self) -> Self {
        self.guild = None;
        self
    }

    pub fn from_bot(mut self) -> Self {
        self.author_is_bot = true;
        self
    }

    pub fn boxed(self) -> BoxedEvent {
        Arc::new(self)
    }
}

impl ChatEvent for MockEvent {
    fn text(&self) -> &str {
        &self.text
    }

    fn author(&self) -> UserId {
        self.author
    }

    fn author_is_bot(&self) -> bool {
        self.author_is_bot
    }

    fn guild(&self) -> Option<GuildId> {
        self.guild
    }

    fn channel(&self) -> ChannelId {
        ChannelId::new(7)
    }

    fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }
}

pub struct MockDirectory {
    roles: HashMap<UserId, Vec<RoleId>>,
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self {
            roles: HashMap::from([(MODERATOR, vec![MODERATORS])]),
        }
    }
}

impl Directory for MockDirectory {
    fn guild_owner(&self, _guild: GuildId) -> Option<UserId> {
        Some(OWNER)
    }

    fn member_roles(&self, _guild: GuildId, user: UserId) -> Vec<RoleId> {
        self.roles.get(&user).cloned().unwrap_or_default()
    }

    fn is_administrator(&self, _guild: GuildId, user: UserId) -> bool {
        user == ADMIN
    }

    fn everyone_role(&self, guild: GuildId) -> RoleId {
        RoleId::new(guild.get())
    }

    fn role_name(&self, role: RoleId) -> Option<String> {
        match role {
            EVERYONE => Some("@everyone".into()),
            MODERATORS => Some("moderators".into()),
            _ => None,
        }
    }
}

/// A message recorded by [`MockBot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub private: bool,
    pub text: String,
}

#[derive(Default)]
pub struct MockBot {
    directory: MockDirectory,
    sent: Mutex<Vec<Sent>>,
    deleted: Mutex<Vec<String>>,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn boxed(self: &Arc<Self>) -> BoxedBot {
        Arc::clone(self) as BoxedBot
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Ids passed to `delete_message`, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    /// Text of the last message, public or private.
    pub fn last(&self) -> Option<String> {
        self.sent.lock().last().map(|s| s.text.clone())
    }
}

#[async_trait]
impl Bot for MockBot {
    fn id(&self) -> &str {
        "mock"
    }

    async fn send(&self, _event: &dyn ChatEvent, message: &str) -> ApiResult<String> {
        let mut sent = self.sent.lock();
        sent.push(Sent {
            private: false,
            text: message.to_string(),
        });
        Ok(sent.len().to_string())
    }

    async fn send_private(&self, _event: &dyn ChatEvent, message: &str) -> ApiResult<String> {
        let mut sent = self.sent.lock();
        sent.push(Sent {
            private: true,
            text: message.to_string(),
        });
        Ok(sent.len().to_string())
    }

    async fn delete_message(&self, _event: &dyn ChatEvent, message_id: &str) -> ApiResult<()> {
        self.deleted.lock().push(message_id.to_string());
        Ok(())
    }

    fn directory(&self) -> &dyn Directory {
        &self.directory
    }
}

/// A handler that does nothing.
pub async fn noop(_ctx: CommandContext) -> ActivityResult {
    Ok(())
}
