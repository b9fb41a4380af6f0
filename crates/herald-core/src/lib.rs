//! # Herald Core
//!
//! Foundation types for the Herald command dispatcher.
//!
//! This crate holds the pieces every other Herald crate agrees on:
//!
//! - **Identifiers**: [`GuildId`], [`UserId`], [`RoleId`], [`ChannelId`], [`EmojiId`]
//! - **Routes**: [`Route`], the token sequence naming a command
//! - **Transport boundary**: [`ChatEvent`] for inbound messages, [`Bot`] for
//!   replies and [`Directory`] for guild membership lookups
//!
//! ```text
//! ┌─────────────┐ ChatEvent ┌────────────┐  reply   ┌─────────────┐
//! │  Transport  │──────────▶│ Dispatcher │─────────▶│ Bot::send   │
//! └─────────────┘           └────────────┘          └─────────────┘
//!                                 │ Directory
//!                                 ▼
//!                           member / roles
//! ```

pub mod bot;
pub mod error;
pub mod event;
pub mod id;
pub mod route;

pub use bot::{Bot, BoxedBot, Directory, Member};
pub use error::{ApiError, ApiResult, RouteError};
pub use event::{BoxedEvent, ChatEvent};
pub use id::{ChannelId, EmojiId, GuildId, RoleId, UserId};
pub use route::Route;
