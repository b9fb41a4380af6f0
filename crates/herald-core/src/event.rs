//! Inbound chat events.
//!
//! The dispatcher only needs a handful of accessors from an incoming message.
//! Transports wrap their native message type and implement [`ChatEvent`].

use std::sync::Arc;

use crate::id::{ChannelId, GuildId, UserId};

/// A text message received from the chat platform.
pub trait ChatEvent: Send + Sync + 'static {
    /// Raw message text, prefix included.
    fn text(&self) -> &str;

    /// The author of the message.
    fn author(&self) -> UserId;

    /// Whether the author is itself a bot account.
    fn author_is_bot(&self) -> bool {
        false
    }

    /// The guild the message was posted in, `None` for direct messages.
    fn guild(&self) -> Option<GuildId>;

    /// The channel the message was posted in.
    fn channel(&self) -> ChannelId;

    /// Platform id of the message, if the transport can address it later.
    fn message_id(&self) -> Option<&str> {
        None
    }
}

/// A shared, type-erased event.
pub type BoxedEvent = Arc<dyn ChatEvent>;
