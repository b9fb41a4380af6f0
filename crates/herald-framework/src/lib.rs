//! # Herald Framework
//!
//! The command-dispatch core of a chat bot.
//!
//! This layer provides:
//! - A router mapping leading message tokens onto registered activities,
//!   including configured aliases
//! - A per-guild permission engine of ordered allow/deny rules keyed by
//!   role and route path expression
//! - A request binder that turns the remaining text into a typed request
//!   through a chain of parsers
//! - A dispatcher tying the three together, translating handler errors into
//!   replies
//!
//! Transports and persistence live elsewhere: the framework only sees
//! [`herald_core::ChatEvent`] and [`herald_core::Bot`].
//!
//! ```rust,ignore
//! use herald_framework::{Activity, CommandContext, ActivityResult, Dispatcher, Request};
//! use herald_core::Route;
//!
//! #[derive(Request)]
//! struct Roll {
//!     #[param(ordinal = 0, description = "Number of sides.")]
//!     sides: i32,
//! }
//!
//! async fn roll(ctx: CommandContext, req: Roll) -> ActivityResult {
//!     ctx.reply(&format!("You rolled {}", req.sides)).await
//! }
//!
//! let dispatcher = Dispatcher::builder("!")
//!     .activity(Activity::builder(Route::parse("roll")?).handle_request(roll))
//!     .with_help()
//!     .build()?;
//! ```

extern crate self as herald_framework;

pub mod activity;
pub mod alias;
pub mod builtin;
pub mod dispatcher;
pub mod error;
pub mod path;
pub mod permission;
pub mod request;
pub mod router;
pub mod usage;

#[cfg(test)]
mod testing;

pub use activity::{Activity, ActivityBuilder, CommandContext, HandlesNoArgs, HandlesRequest};
pub use alias::AliasRegistry;
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherBuilder, InboundMessage};
pub use error::{
    ActivityError, ActivityResult, BoxError, PermissionError, PermissionResult, RegistrationError,
    RegistrationResult,
};
pub use path::{MalformedPathExpression, PathExpression};
pub use permission::{GuildConfiguration, Rule, RuleStore, Subject};
pub use request::{
    BindError, BoundArgs, FromParam, ParamEnum, Parser, ParserChain, Request, RequestBinder,
};
pub use router::{RouteMatch, Router};

pub use herald_macros::{ParamEnum, Request};
