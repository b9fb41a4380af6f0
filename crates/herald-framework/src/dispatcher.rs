//! Message dispatch.
//!
//! The [`Dispatcher`] turns an inbound message into at most one activity
//! invocation:
//!
//! 1. Messages from bots, and messages without the prefix, are ignored
//! 2. The text after the prefix is split into tokens and routed
//! 3. The member must pass the permission check; denials are silent
//! 4. The argument text is bound to the activity's request, if any
//! 5. The handler runs, and its result is translated into a reply
//!
//! Business and technical error replies are deleted after [`ERROR_TTL`].
//! A panicking handler is reported like any other technical fault.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::builder("t!")
//!     .activity(ping)
//!     .restricted_activity(shutdown)
//!     .aliases([("p", "ping")])
//!     .with_permission_commands()
//!     .with_help()
//!     .build()?;
//!
//! let outcome = dispatcher.dispatch(event, bot).await;
//! ```
//!
//! `Dispatcher` also implements `tower::Service<InboundMessage>`, so it can be
//! wrapped in tower middleware by transports that want to.

use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use herald_core::{BoxedBot, BoxedEvent, Member, Route};
use tower::Service;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::activity::{Activity, ActivityHandler, CommandContext};
use crate::builtin;
use crate::error::{ActivityError, ActivityResult, RegistrationError, RegistrationResult};
use crate::permission::RuleStore;
use crate::request::{ParseContext, ParserChain, RequestBinder};
use crate::router::{RouteMatch, Router, strip_leading_tokens};
use crate::usage::basic_usage;

/// Reply sent when an activity fails unexpectedly.
pub const TECHNICAL_FAULT_REPLY: &str = "Something bad happened. :confounded:";

/// How long business and technical error replies stay visible.
pub const ERROR_TTL: Duration = Duration::from_secs(15);

// =============================================================================
// Outcome
// =============================================================================

/// How a message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// Authored by a bot.
    Ignored,
    /// No prefix, or nothing after it.
    NotCommand,
    /// No activity matched the tokens.
    NoMatch,
    /// The member may not use the activity.
    Denied,
    /// Binding or the handler reported a usage error.
    UsageError,
    /// The handler succeeded.
    Completed,
    /// The handler reported an expected failure.
    BusinessError,
    /// The handler failed unexpectedly.
    TechnicalFault,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignored => "ignored",
            Self::NotCommand => "not_command",
            Self::NoMatch => "no_match",
            Self::Denied => "denied",
            Self::UsageError => "usage_error",
            Self::Completed => "completed",
            Self::BusinessError => "business_error",
            Self::TechnicalFault => "technical_fault",
        }
    }

    /// Whether an activity was selected and allowed to run.
    pub fn reached_activity(self) -> bool {
        matches!(
            self,
            Self::UsageError | Self::Completed | Self::BusinessError | Self::TechnicalFault
        )
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

struct DispatcherInner {
    prefix: String,
    router: Router,
    rules: Arc<RuleStore>,
    binder: RequestBinder,
}

/// Routes messages to activities. Cheap to clone.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Starts building a dispatcher for `prefix`.
    pub fn builder(prefix: impl Into<String>) -> DispatcherBuilder {
        DispatcherBuilder::new(prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    /// The shared rule store.
    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.inner.rules
    }

    pub fn binder(&self) -> &RequestBinder {
        &self.inner.binder
    }

    /// Registers an activity everyone may use by default.
    pub fn register_public(&self, activity: Activity) -> RegistrationResult<()> {
        let route = self.register(activity)?;
        self.inner.rules.add_public_activity(route);
        Ok(())
    }

    /// Registers an activity denied to everyone by default.
    pub fn register_restricted(&self, activity: Activity) -> RegistrationResult<()> {
        let route = self.register(activity)?;
        self.inner.rules.add_restricted_activity(route);
        Ok(())
    }

    fn register(&self, activity: Activity) -> RegistrationResult<Route> {
        validate_schema(&self.inner.binder, &activity)?;
        let activity = self.inner.router.register(activity)?;
        Ok(activity.route().clone())
    }

    /// Usage text for `activity` as reached through `route`.
    pub fn usage(&self, route: &Route, activity: &Activity) -> String {
        let schema = activity.schema(self.inner.binder.cache()).and_then(Result::ok);
        basic_usage(&self.inner.prefix, route, activity, schema.as_deref())
    }

    /// Handles one message.
    pub async fn dispatch(&self, event: BoxedEvent, bot: BoxedBot) -> DispatchOutcome {
        let span = info_span!(
            "dispatch",
            bot = bot.id(),
            author = %event.author(),
            guild = ?event.guild(),
        );
        async move {
            let start = Instant::now();
            let outcome = self.run(event, bot).await;
            debug!(
                outcome = %outcome,
                latency_ms = start.elapsed().as_millis() as u64,
                "Dispatch finished"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, event: BoxedEvent, bot: BoxedBot) -> DispatchOutcome {
        if event.author_is_bot() {
            return DispatchOutcome::Ignored;
        }
        let Some(body) = event.text().strip_prefix(self.prefix()) else {
            return DispatchOutcome::NotCommand;
        };
        let tokens: Vec<&str> = body.split_whitespace().collect();
        if tokens.is_empty() {
            return DispatchOutcome::NotCommand;
        }

        let Some(route_match) = self.inner.router.match_tokens(&tokens) else {
            debug!(tokens = tokens.len(), "No activity matched");
            return DispatchOutcome::NoMatch;
        };
        let activity = Arc::clone(&route_match.activity);

        let guild = event.guild();
        let member = match guild {
            Some(guild) => bot.directory().member(guild, event.author()),
            None => Member::new(event.author()),
        };
        if !self.inner.rules.check_accessibility(activity.route(), &member, guild) {
            debug!(route = %activity.route(), "Member may not use activity");
            return DispatchOutcome::Denied;
        }

        let args = strip_leading_tokens(body, route_match.matched.len()).to_string();
        let ctx = CommandContext::new(
            Arc::clone(&event),
            Arc::clone(&bot),
            activity.route().clone(),
            route_match.matched.clone(),
            args,
            self.clone(),
        );

        let result = self.invoke(&activity, ctx.clone()).await;
        let outcome = self.respond(&ctx, &route_match, result).await;
        if activity.deletes_command() {
            ctx.delete_command().await;
        }
        outcome
    }

    async fn invoke(&self, activity: &Activity, ctx: CommandContext) -> ActivityResult {
        match activity.handler() {
            ActivityHandler::NoArgs(handler) => timed(activity.route(), handler.enact(ctx)).await,
            ActivityHandler::Request(handler) => {
                let schema = handler
                    .schema(self.inner.binder.cache())
                    .map_err(ActivityError::technical)?;
                let bound = {
                    let directory = ctx.bot().directory();
                    let parse_ctx = ParseContext::new(ctx.guild(), directory);
                    self.inner.binder.bind_args(&schema, ctx.args(), &parse_ctx)?
                };
                timed(activity.route(), handler.enact(ctx, bound)).await
            }
        }
    }

    async fn respond(
        &self,
        ctx: &CommandContext,
        route_match: &RouteMatch,
        result: ActivityResult,
    ) -> DispatchOutcome {
        let (outcome, sent) = match result {
            Ok(()) => return DispatchOutcome::Completed,
            Err(ActivityError::Usage(message)) => {
                let usage = self.usage(&route_match.matched, &route_match.activity);
                let reply = format!("{message}\n\nUsage:\n``{usage}``");
                (DispatchOutcome::UsageError, ctx.reply(&reply).await)
            }
            Err(ActivityError::Business(message)) => (
                DispatchOutcome::BusinessError,
                ctx.reply_transient(&message, ERROR_TTL).await,
            ),
            Err(ActivityError::Technical(err)) => {
                error!(route = %route_match.activity.route(), error = %err, "Activity failed");
                (
                    DispatchOutcome::TechnicalFault,
                    ctx.reply_transient(TECHNICAL_FAULT_REPLY, ERROR_TTL).await,
                )
            }
        };

        if let Err(e) = sent {
            warn!(error = %e, "Failed to send reply");
        }
        outcome
    }
}

async fn timed(route: &Route, invocation: impl Future<Output = ActivityResult>) -> ActivityResult {
    let start = Instant::now();
    let result = match AssertUnwindSafe(invocation).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(ActivityError::technical(format!(
            "activity panicked: {}",
            panic_message(&*payload)
        ))),
    };
    debug!(
        route = %route,
        ok = result.is_ok(),
        latency_ms = start.elapsed().as_millis() as u64,
        "Activity invoked"
    );
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "opaque panic payload"
    }
}

fn validate_schema(binder: &RequestBinder, activity: &Activity) -> RegistrationResult<()> {
    match activity.schema(binder.cache()) {
        Some(Err(source)) => Err(RegistrationError::InvalidSchema {
            route: activity.route().clone(),
            source,
        }),
        _ => Ok(()),
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("prefix", &self.inner.prefix)
            .field("activities", &self.inner.router.activities().len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder {
    prefix: String,
    activities: Vec<(Activity, bool)>,
    aliases: Vec<(String, String)>,
    rules: Option<Arc<RuleStore>>,
    chain: ParserChain,
    permission_commands: bool,
    help: bool,
}

impl DispatcherBuilder {
    fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            activities: Vec::new(),
            aliases: Vec::new(),
            rules: None,
            chain: ParserChain::default(),
            permission_commands: false,
            help: false,
        }
    }

    /// Adds an activity everyone may use by default.
    pub fn activity(mut self, activity: Activity) -> Self {
        self.activities.push((activity, true));
        self
    }

    /// Adds an activity denied to everyone by default.
    pub fn restricted_activity(mut self, activity: Activity) -> Self {
        self.activities.push((activity, false));
        self
    }

    /// Adds aliases (alias text → canonical route text).
    pub fn aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.aliases
            .extend(aliases.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Shares an existing rule store instead of creating an empty one.
    pub fn rules(mut self, rules: Arc<RuleStore>) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Replaces the parser chain.
    pub fn parser_chain(mut self, chain: ParserChain) -> Self {
        self.chain = chain;
        self
    }

    /// Adds the `permissions` administration commands.
    pub fn with_permission_commands(mut self) -> Self {
        self.permission_commands = true;
        self
    }

    /// Adds the `help` command.
    pub fn with_help(mut self) -> Self {
        self.help = true;
        self
    }

    /// Validates every activity and builds the dispatcher.
    pub fn build(mut self) -> RegistrationResult<Dispatcher> {
        if self.permission_commands {
            self.activities
                .extend(builtin::permission_activities()?.into_iter().map(|a| (a, false)));
        }

        let binder = RequestBinder::new(self.chain);
        for (activity, _) in &self.activities {
            validate_schema(&binder, activity)?;
        }

        let rules = self.rules.unwrap_or_default();
        let mut activities = Vec::with_capacity(self.activities.len());
        for (activity, public) in self.activities {
            if public {
                rules.add_public_activity(activity.route().clone());
            } else {
                rules.add_restricted_activity(activity.route().clone());
            }
            activities.push(activity);
        }

        let router = Router::new(activities, self.aliases)?;
        let dispatcher = Dispatcher {
            inner: Arc::new(DispatcherInner {
                prefix: self.prefix,
                router,
                rules,
                binder,
            }),
        };

        if self.help {
            dispatcher.register_public(builtin::help_activity()?)?;
        }
        Ok(dispatcher)
    }
}

// =============================================================================
// Tower Service
// =============================================================================

/// A message paired with the bot that received it.
#[derive(Clone)]
pub struct InboundMessage {
    pub event: BoxedEvent,
    pub bot: BoxedBot,
}

impl InboundMessage {
    pub fn new(event: BoxedEvent, bot: BoxedBot) -> Self {
        Self { event, bot }
    }
}

impl Service<InboundMessage> for Dispatcher {
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<DispatchOutcome, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, msg: InboundMessage) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(msg.event, msg.bot).await) })
    }
}
