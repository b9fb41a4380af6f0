//! Activities and their handlers.
//!
//! An [`Activity`] ties a [`Route`] to a handler. Handlers come in two kinds:
//!
//! - [`HandlesNoArgs`]: receives only the [`CommandContext`]
//! - [`HandlesRequest<R>`]: additionally receives a bound [`Request`]
//!
//! Both are implemented for plain async closures, so most activities are
//! declared inline:
//!
//! ```rust,ignore
//! let ping = Activity::builder(Route::parse("ping")?)
//!     .description("Checks that the bot is alive.")
//!     .handle(|ctx: CommandContext| async move { ctx.reply("pong").await });
//!
//! let echo = Activity::builder(Route::parse("echo")?)
//!     .handle_request(|ctx: CommandContext, req: EchoRequest| async move {
//!         ctx.reply(&req.text).await
//!     });
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use herald_core::{BoxedBot, BoxedEvent, ChannelId, GuildId, Member, Route, UserId};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::dispatcher::Dispatcher;
use crate::error::ActivityResult;
use crate::request::{BoundArgs, Request, Schema, SchemaCache, SchemaError};

// =============================================================================
// Command Context
// =============================================================================

/// Everything a handler knows about the message that triggered it.
///
/// Cloning is cheap: the event, bot and dispatcher are shared.
#[derive(Clone)]
pub struct CommandContext {
    event: BoxedEvent,
    bot: BoxedBot,
    activity_route: Route,
    matched_route: Route,
    args: String,
    dispatcher: Dispatcher,
}

impl CommandContext {
    pub(crate) fn new(
        event: BoxedEvent,
        bot: BoxedBot,
        activity_route: Route,
        matched_route: Route,
        args: String,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            event,
            bot,
            activity_route,
            matched_route,
            args,
            dispatcher,
        }
    }

    /// The triggering event.
    pub fn event(&self) -> &BoxedEvent {
        &self.event
    }

    /// The bot that received the event.
    pub fn bot(&self) -> &BoxedBot {
        &self.bot
    }

    pub fn guild(&self) -> Option<GuildId> {
        self.event.guild()
    }

    pub fn author(&self) -> UserId {
        self.event.author()
    }

    pub fn channel(&self) -> ChannelId {
        self.event.channel()
    }

    /// The author as seen by permission checks.
    pub fn member(&self) -> Member {
        match self.guild() {
            Some(guild) => self.bot.directory().member(guild, self.author()),
            None => Member::new(self.author()),
        }
    }

    /// Canonical route of the running activity.
    pub fn activity_route(&self) -> &Route {
        &self.activity_route
    }

    /// The route the user actually typed, possibly an alias.
    pub fn matched_route(&self) -> &Route {
        &self.matched_route
    }

    /// Argument text after the matched route.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// The command prefix.
    pub fn prefix(&self) -> &str {
        self.dispatcher.prefix()
    }

    /// The dispatcher running this activity.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Replies in the originating channel.
    pub async fn reply(&self, text: &str) -> ActivityResult {
        self.bot.send(&*self.event, text).await?;
        Ok(())
    }

    /// Replies privately to the author.
    pub async fn reply_private(&self, text: &str) -> ActivityResult {
        self.bot.send_private(&*self.event, text).await?;
        Ok(())
    }

    /// Replies in the originating channel and deletes the reply after `ttl`.
    pub async fn reply_transient(&self, text: &str, ttl: Duration) -> ActivityResult {
        let message_id = self.bot.send(&*self.event, text).await?;
        expire_message(Arc::clone(&self.bot), Arc::clone(&self.event), message_id, ttl);
        Ok(())
    }

    /// Deletes the message that triggered this activity. Failures are only
    /// logged.
    pub async fn delete_command(&self) {
        let Some(message_id) = self.event.message_id() else {
            return;
        };
        if let Err(e) = self.bot.delete_message(&*self.event, message_id).await {
            debug!(message_id = %message_id, error = %e, "Could not delete command message");
        }
    }
}

/// Deletes `message_id` once `ttl` has passed, without blocking the caller.
fn expire_message(bot: BoxedBot, event: BoxedEvent, message_id: String, ttl: Duration) {
    let Ok(handle) = Handle::try_current() else {
        warn!(message_id = %message_id, "No async runtime to expire the message on, keeping it");
        return;
    };
    handle.spawn(async move {
        tokio::time::sleep(ttl).await;
        if let Err(e) = bot.delete_message(&*event, &message_id).await {
            debug!(message_id = %message_id, error = %e, "Could not expire message");
        }
    });
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("bot", &self.bot.id())
            .field("activity_route", &self.activity_route)
            .field("matched_route", &self.matched_route)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Handler Traits
// =============================================================================

/// A handler that takes no structured arguments.
#[async_trait]
pub trait HandlesNoArgs: Send + Sync + 'static {
    async fn enact(&self, ctx: CommandContext) -> ActivityResult;
}

#[async_trait]
impl<F, Fut> HandlesNoArgs for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActivityResult> + Send + 'static,
{
    async fn enact(&self, ctx: CommandContext) -> ActivityResult {
        (self)(ctx).await
    }
}

/// A handler that receives a bound request of type `R`.
#[async_trait]
pub trait HandlesRequest<R: Request>: Send + Sync + 'static {
    async fn enact(&self, ctx: CommandContext, request: R) -> ActivityResult;
}

#[async_trait]
impl<R, F, Fut> HandlesRequest<R> for F
where
    R: Request,
    F: Fn(CommandContext, R) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActivityResult> + Send + 'static,
{
    async fn enact(&self, ctx: CommandContext, request: R) -> ActivityResult {
        (self)(ctx, request).await
    }
}

/// A request handler with its request type erased.
#[async_trait]
pub(crate) trait BindingHandler: Send + Sync {
    /// Name of the request type, for logs.
    fn request_type(&self) -> &'static str;

    fn schema(&self, cache: &SchemaCache) -> Result<Arc<Schema>, SchemaError>;

    async fn enact(&self, ctx: CommandContext, args: BoundArgs) -> ActivityResult;
}

struct TypedRequestHandler<R, H> {
    handler: H,
    _request: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R, H> BindingHandler for TypedRequestHandler<R, H>
where
    R: Request,
    H: HandlesRequest<R>,
{
    fn request_type(&self) -> &'static str {
        std::any::type_name::<R>()
    }

    fn schema(&self, cache: &SchemaCache) -> Result<Arc<Schema>, SchemaError> {
        cache.get::<R>()
    }

    async fn enact(&self, ctx: CommandContext, args: BoundArgs) -> ActivityResult {
        let request = R::from_args(args)?;
        self.handler.enact(ctx, request).await
    }
}

#[derive(Clone)]
pub(crate) enum ActivityHandler {
    NoArgs(Arc<dyn HandlesNoArgs>),
    Request(Arc<dyn BindingHandler>),
}

// =============================================================================
// Activity
// =============================================================================

/// A command: a route, its help metadata and its handler.
#[derive(Clone)]
pub struct Activity {
    route: Route,
    parameters: Vec<String>,
    description: String,
    usage_description: Option<String>,
    deletes_command: bool,
    handler: ActivityHandler,
}

impl Activity {
    /// Starts building an activity at `route`.
    pub fn builder(route: Route) -> ActivityBuilder {
        ActivityBuilder {
            route,
            parameters: Vec::new(),
            description: String::new(),
            usage_description: None,
            deletes_command: false,
        }
    }

    /// The canonical route.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Display names of the parameters, used when there is no schema.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// One-line description shown in listings.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Longer text shown by `help <route>`.
    pub fn usage_description(&self) -> Option<&str> {
        self.usage_description.as_deref()
    }

    /// Whether the triggering message is deleted once the activity has run.
    pub fn deletes_command(&self) -> bool {
        self.deletes_command
    }

    /// Whether the handler takes a bound request.
    pub fn takes_request(&self) -> bool {
        matches!(self.handler, ActivityHandler::Request(_))
    }

    /// The request schema, if the handler takes a request.
    pub fn schema(&self, cache: &SchemaCache) -> Option<Result<Arc<Schema>, SchemaError>> {
        match &self.handler {
            ActivityHandler::NoArgs(_) => None,
            ActivityHandler::Request(handler) => Some(handler.schema(cache)),
        }
    }

    pub(crate) fn handler(&self) -> &ActivityHandler {
        &self.handler
    }
}

impl fmt::Debug for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handler = match &self.handler {
            ActivityHandler::NoArgs(_) => "no-args",
            ActivityHandler::Request(h) => h.request_type(),
        };
        f.debug_struct("Activity")
            .field("route", &self.route)
            .field("parameters", &self.parameters)
            .field("description", &self.description)
            .field("deletes_command", &self.deletes_command)
            .field("handler", &handler)
            .finish()
    }
}

/// Builder for [`Activity`].
#[derive(Debug)]
pub struct ActivityBuilder {
    route: Route,
    parameters: Vec<String>,
    description: String,
    usage_description: Option<String>,
    deletes_command: bool,
}

impl ActivityBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Help text for `help <route>`. `${absoluteReferencedRoute}` expands to
    /// the prefixed route the user asked about.
    pub fn usage_description(mut self, text: impl Into<String>) -> Self {
        self.usage_description = Some(text.into());
        self
    }

    /// Deletes the triggering message after the activity has run.
    pub fn delete_command(mut self, enabled: bool) -> Self {
        self.deletes_command = enabled;
        self
    }

    /// Adds a parameter display name.
    pub fn parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    /// Finishes with a handler that takes no arguments.
    pub fn handle<H: HandlesNoArgs>(self, handler: H) -> Activity {
        self.finish(ActivityHandler::NoArgs(Arc::new(handler)))
    }

    /// Finishes with a handler that takes a bound `R`.
    pub fn handle_request<R, H>(self, handler: H) -> Activity
    where
        R: Request,
        H: HandlesRequest<R>,
    {
        self.finish(ActivityHandler::Request(Arc::new(TypedRequestHandler {
            handler,
            _request: PhantomData,
        })))
    }

    fn finish(self, handler: ActivityHandler) -> Activity {
        Activity {
            route: self.route,
            parameters: self.parameters,
            description: self.description,
            usage_description: self.usage_description,
            deletes_command: self.deletes_command,
            handler,
        }
    }
}
