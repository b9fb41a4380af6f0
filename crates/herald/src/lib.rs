//! # Herald
//!
//! A command dispatcher for chat bots.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐     ┌────────────────────────────────────────────────────┐
//! │ Transport │────▶│ Dispatcher                                         │
//! │  (Bot)    │     │  prefix ─▶ Router ─▶ RuleStore ─▶ RequestBinder ─▶ │──▶ Activity
//! └───────────┘◀────│                       (aliases)   (parser chain)   │
//!    replies        └────────────────────────────────────────────────────┘
//! ```
//!
//! - **Router**: longest registered route matching the leading tokens,
//!   directly or through an alias
//! - **RuleStore**: ordered per-guild allow/deny rules; owners and
//!   administrators always pass, denials are silent
//! - **RequestBinder**: turns the remaining text into a typed request
//! - **Activities**: user-defined async handlers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[derive(Request)]
//! struct Roll {
//!     #[param(ordinal = 0, description = "Number of sides.")]
//!     sides: i32,
//! }
//!
//! async fn roll(ctx: CommandContext, req: Roll) -> ActivityResult {
//!     ctx.reply(&format!("You rolled a d{}.", req.sides)).await
//! }
//!
//! let runtime = HeraldRuntime::builder()
//!     .activity(
//!         Activity::builder(Route::parse("roll")?)
//!             .description("Rolls a die.")
//!             .handle_request(roll),
//!     )
//!     .build()?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: `herald.toml` configuration files (default)
//! - `yaml-config`: `herald.yaml` configuration files
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, shutdown_signal};

    // Activities and handlers
    pub use herald_framework::{
        Activity, ActivityError, ActivityResult, CommandContext, DispatchOutcome, Dispatcher,
    };

    // Typed requests, traits and derives
    pub use herald_framework::{ParamEnum, Request};

    // Transport boundary
    pub use herald_core::{
        Bot, BoxedBot, BoxedEvent, ChannelId, ChatEvent, Directory, GuildId, Member, RoleId,
        Route, UserId,
    };
}
