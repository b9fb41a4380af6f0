//! Console Bot
//!
//! Runs the full Herald stack against the terminal: every line typed is a
//! message in one guild, every reply is printed.
//!
//! ```text
//! > t!help
//! [bot #1] Here's what I can do for you...
//! (message c1 deleted)
//! > t!math add 2 3.5
//! [bot #2] 5.5
//! > :user 1
//! > t!permissions add 1 <@&100> deny echo
//! ```
//!
//! Lines starting with `:` control the console itself:
//!
//! - `:user <id>`: speak as another user
//! - `:dm`: toggle between the guild and direct messages
//! - `:save`: write the rule file
//! - `:quit`: save and exit
//!
//! # Usage
//!
//! ```bash
//! cargo run --package console-bot -- --owner 1 --user 2 --role 2=50
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::Parser;
use herald::core::ApiResult;
use herald::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

// ============================================================================
// Command Line
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "console-bot", version, about = "Talk to a Herald bot from the terminal")]
struct Args {
    /// Configuration file (defaults to searching for herald.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ignore HERALD_* environment variables
    #[arg(long)]
    no_env: bool,

    /// Guild the console speaks in
    #[arg(long, default_value_t = 1)]
    guild: u64,

    /// Owner of the guild
    #[arg(long, default_value_t = 1)]
    owner: u64,

    /// User the console speaks as
    #[arg(short, long, default_value_t = 2)]
    user: u64,

    /// Users holding the administrator permission
    #[arg(long = "admin")]
    admins: Vec<u64>,

    /// Role memberships as USER=ROLE
    #[arg(long = "role", value_parser = parse_membership)]
    roles: Vec<(u64, u64)>,
}

fn parse_membership(s: &str) -> Result<(u64, u64), String> {
    let (user, role) = s
        .split_once('=')
        .ok_or_else(|| format!("expected USER=ROLE, got `{s}`"))?;
    let user = user.trim().parse().map_err(|e| format!("bad user id: {e}"))?;
    let role = role.trim().parse().map_err(|e| format!("bad role id: {e}"))?;
    Ok((user, role))
}

// ============================================================================
// Console Transport
// ============================================================================

struct ConsoleEvent {
    id: String,
    text: String,
    author: UserId,
    guild: Option<GuildId>,
}

impl ChatEvent for ConsoleEvent {
    fn text(&self) -> &str {
        &self.text
    }

    fn author(&self) -> UserId {
        self.author
    }

    fn guild(&self) -> Option<GuildId> {
        self.guild
    }

    fn channel(&self) -> ChannelId {
        ChannelId::new(1)
    }

    fn message_id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

struct ConsoleDirectory {
    owner: UserId,
    admins: Vec<UserId>,
    roles: HashMap<UserId, Vec<RoleId>>,
}

impl Directory for ConsoleDirectory {
    fn guild_owner(&self, _guild: GuildId) -> Option<UserId> {
        Some(self.owner)
    }

    fn member_roles(&self, _guild: GuildId, user: UserId) -> Vec<RoleId> {
        self.roles.get(&user).cloned().unwrap_or_default()
    }

    fn is_administrator(&self, _guild: GuildId, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    /// The everyone role shares the guild's id.
    fn everyone_role(&self, guild: GuildId) -> RoleId {
        RoleId::new(guild.get())
    }

    fn role_name(&self, role: RoleId) -> Option<String> {
        Some(format!("role {role}"))
    }
}

struct ConsoleBot {
    directory: ConsoleDirectory,
    sent: AtomicU64,
}

impl ConsoleBot {
    fn next_id(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[async_trait]
impl Bot for ConsoleBot {
    fn id(&self) -> &str {
        "console"
    }

    async fn send(&self, _event: &dyn ChatEvent, message: &str) -> ApiResult<String> {
        let id = self.next_id();
        println!("[bot #{id}] {message}");
        Ok(id.to_string())
    }

    async fn send_private(&self, event: &dyn ChatEvent, message: &str) -> ApiResult<String> {
        let id = self.next_id();
        println!("[bot #{id} -> {}] {message}", event.author());
        Ok(id.to_string())
    }

    async fn delete_message(&self, _event: &dyn ChatEvent, message_id: &str) -> ApiResult<()> {
        println!("(message {message_id} deleted)");
        Ok(())
    }

    fn directory(&self) -> &dyn Directory {
        &self.directory
    }
}

// ============================================================================
// Activities
// ============================================================================

async fn ping(ctx: CommandContext) -> ActivityResult {
    ctx.reply("Pong!").await
}

#[derive(Request)]
struct EchoRequest {
    #[param(name = "text", ordinal = 0, description = "What to say.", capture_remaining)]
    text: String,
}

async fn echo(ctx: CommandContext, req: EchoRequest) -> ActivityResult {
    ctx.reply(&req.text).await
}

#[derive(Request)]
struct Operands {
    #[param(ordinal = 0)]
    a: f64,
    #[param(ordinal = 1)]
    b: f64,
}

async fn add(ctx: CommandContext, req: Operands) -> ActivityResult {
    ctx.reply(&(req.a + req.b).to_string()).await
}

async fn divide(ctx: CommandContext, req: Operands) -> ActivityResult {
    if req.b == 0.0 {
        return Err(ActivityError::business("I can't divide by zero."));
    }
    ctx.reply(&(req.a / req.b).to_string()).await
}

#[derive(ParamEnum)]
enum Tone {
    Warm,
    Formal,
}

#[derive(Request)]
struct GreetRequest {
    #[param(ordinal = 0, description = "Who to greet.")]
    user: Option<UserId>,
    #[param(ordinal = 1)]
    tone: Option<Tone>,
}

async fn greet(ctx: CommandContext, req: GreetRequest) -> ActivityResult {
    let user = req.user.unwrap_or_else(|| ctx.author());
    let text = match req.tone.unwrap_or(Tone::Warm) {
        Tone::Warm => format!("Hey <@{user}>, good to see you!"),
        Tone::Formal => format!("Good day, <@{user}>."),
    };
    ctx.reply(&text).await
}

#[derive(Request)]
struct AnnounceRequest {
    #[param(ordinal = 0, description = "A channel mention.")]
    channel: ChannelId,
    #[param(ordinal = 1, description = "The announcement.", capture_remaining)]
    message: String,
}

async fn announce(ctx: CommandContext, req: AnnounceRequest) -> ActivityResult {
    ctx.reply(&format!("📣 <#{}>: {}", req.channel, req.message))
        .await
}

fn activities() -> Result<Vec<(Activity, bool)>> {
    Ok(vec![
        (
            Activity::builder(Route::parse("ping")?)
                .description("Checks that I'm alive.")
                .handle(ping),
            true,
        ),
        (
            Activity::builder(Route::parse("echo")?)
                .description("Repeats what you say.")
                .handle_request(echo),
            true,
        ),
        (
            Activity::builder(Route::parse("math add")?)
                .description("Adds two numbers.")
                .handle_request(add),
            true,
        ),
        (
            Activity::builder(Route::parse("math divide")?)
                .description("Divides two numbers.")
                .usage_description("Say ``${absoluteReferencedRoute} 10 4`` to get 2.5.")
                .handle_request(divide),
            true,
        ),
        (
            Activity::builder(Route::parse("greet")?)
                .description("Says hello.")
                .handle_request(greet),
            true,
        ),
        (
            Activity::builder(Route::parse("announce")?)
                .description("Posts an announcement.")
                .handle_request(announce),
            false,
        ),
    ])
}

// ============================================================================
// Main Entry Point
// ============================================================================

struct Session {
    lines: u64,
    user: UserId,
    guild: GuildId,
    direct: bool,
}

impl Session {
    fn event(&mut self, text: &str) -> BoxedEvent {
        self.lines += 1;
        Arc::new(ConsoleEvent {
            id: format!("c{}", self.lines),
            text: text.to_string(),
            author: self.user,
            guild: (!self.direct).then_some(self.guild),
        })
    }
}

enum Control {
    Continue,
    Quit,
}

fn control(runtime: &HeraldRuntime, session: &mut Session, line: &str) -> Result<Control> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(":user") => {
            let id: u64 = parts
                .next()
                .context("usage: :user <id>")?
                .parse()
                .context("user ids are numbers")?;
            session.user = UserId::new(id);
            println!("Now speaking as user {id}.");
        }
        Some(":dm") => {
            session.direct = !session.direct;
            println!(
                "{}",
                if session.direct {
                    "Now in direct messages."
                } else {
                    "Back in the guild."
                }
            );
        }
        Some(":save") => {
            runtime.save()?;
            println!("Rules saved to {}.", runtime.rules_path().display());
        }
        Some(":quit") => return Ok(Control::Quit),
        other => bail!("unknown console command {}", other.unwrap_or_default()),
    }
    Ok(Control::Continue)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = HeraldRuntime::builder().defaults(HeraldConfig {
        aliases: [("add", "math add"), ("say", "echo")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..Default::default()
    });
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if args.no_env {
        builder = builder.without_env();
    }
    for (activity, public) in activities()? {
        builder = if public {
            builder.activity(activity)
        } else {
            builder.restricted_activity(activity)
        };
    }
    let runtime = builder.build()?;

    let mut roles: HashMap<UserId, Vec<RoleId>> = HashMap::new();
    for (user, role) in &args.roles {
        roles
            .entry(UserId::new(*user))
            .or_default()
            .push(RoleId::new(*role));
    }
    let bot = Arc::new(ConsoleBot {
        directory: ConsoleDirectory {
            owner: UserId::new(args.owner),
            admins: args.admins.iter().copied().map(UserId::new).collect(),
            roles,
        },
        sent: AtomicU64::new(0),
    });
    let boxed: BoxedBot = bot.clone();

    let mut session = Session {
        lines: 0,
        user: UserId::new(args.user),
        guild: GuildId::new(args.guild),
        direct: false,
    };
    runtime.guild_available(session.guild, bot.directory());

    info!(
        prefix = %runtime.config().prefix,
        user = %session.user,
        guild = %session.guild,
        "Console bot ready"
    );
    println!(
        "Type '{}help' to get started, ':quit' to leave.",
        runtime.config().prefix
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut shutdown => None,
        };
        let Some(line) = line else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with(':') {
            match control(&runtime, &mut session, line) {
                Ok(Control::Continue) => {}
                Ok(Control::Quit) => break,
                Err(e) => println!("{e:#}"),
            }
            continue;
        }

        let outcome = runtime
            .handle_message(session.event(line), boxed.clone())
            .await;
        debug!(outcome = %outcome, "Message handled");
        if outcome == DispatchOutcome::Denied {
            println!("(no reply: permission denied)");
        }
    }

    runtime.shutdown()?;
    Ok(())
}
