//! The `help` command.
//!
//! The invoking message is deleted, and the command listing removes itself
//! after [`HELP_MESSAGE_TTL`].

use std::fmt::Write;
use std::time::Duration;

use herald_core::{Route, RouteError};

use crate::Request;
use crate::activity::{Activity, CommandContext};
use crate::error::ActivityResult;
use crate::usage::help_line;

const PLACEHOLDER: &str = "${absoluteReferencedRoute}";

/// How long the command listing stays visible.
pub const HELP_MESSAGE_TTL: Duration = Duration::from_secs(3 * 60);

#[derive(Debug, Request)]
struct HelpRequest {
    #[param(name = "command", ordinal = 0, capture_remaining)]
    command: Option<String>,
}

/// The `help` activity.
pub fn help_activity() -> Result<Activity, RouteError> {
    Ok(Activity::builder(Route::new(["help"])?)
        .description("Shows what I can do.")
        .delete_command(true)
        .handle_request(help))
}

async fn help(ctx: CommandContext, request: HelpRequest) -> ActivityResult {
    match request.command.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        None => {
            ctx.reply_transient(&list_commands(&ctx), HELP_MESSAGE_TTL)
                .await
        }
        Some(command) => ctx.reply(&describe_command(&ctx, command)).await,
    }
}

fn list_commands(ctx: &CommandContext) -> String {
    let dispatcher = ctx.dispatcher();
    let member = ctx.member();

    let mut out = String::from("Here's what I can do for you...\n\n");
    for activity in dispatcher.router().activities().iter() {
        if !dispatcher
            .rules()
            .check_accessibility(activity.route(), &member, ctx.guild())
        {
            continue;
        }
        let usage = dispatcher.usage(activity.route(), activity);
        out.push_str(&help_line(&usage, activity.description()));
        out.push('\n');
    }
    let _ = write!(
        out,
        "\nYou can also say '{}help <command>' to get more help for that command. \
         This message will self-destruct in {} minutes.",
        dispatcher.prefix(),
        HELP_MESSAGE_TTL.as_secs() / 60
    );
    out
}

fn describe_command(ctx: &CommandContext, command: &str) -> String {
    const NOT_FOUND: &str = "Sorry, that command doesn't exist.";

    let Ok(referenced) = Route::parse(command) else {
        return NOT_FOUND.to_string();
    };
    if &referenced == ctx.activity_route() {
        return "Very funny. :expressionless:".to_string();
    }

    let dispatcher = ctx.dispatcher();
    let router = dispatcher.router();
    let activity = router
        .find(&referenced)
        .or_else(|| router.aliases().resolve(&referenced));
    let Some(activity) = activity.filter(|a| {
        dispatcher
            .rules()
            .check_accessibility(a.route(), &ctx.member(), ctx.guild())
    }) else {
        return NOT_FOUND.to_string();
    };

    describe(ctx, &referenced, &activity)
}

fn describe(ctx: &CommandContext, referenced: &Route, activity: &Activity) -> String {
    let mut out = format!("**Command:** ``{}``\n\n", activity.route());

    let aliases = ctx.dispatcher().router().aliases().aliases_of(activity.route());
    if !aliases.is_empty() {
        out.push_str("**Aliases:**\n");
        for alias in aliases {
            let _ = writeln!(out, "``{alias}``");
        }
        out.push('\n');
    }

    match activity.usage_description() {
        Some(text) => {
            let absolute = format!("{}{referenced}", ctx.prefix());
            out.push_str(&text.replace(PLACEHOLDER, &absolute));
        }
        None => out.push_str("No additional usage information."),
    }
    out
}

#[cfg(test)]
mod tests {
    use herald_core::Route;

    use super::HELP_MESSAGE_TTL;
    use crate::activity::Activity;
    use crate::dispatcher::{DispatchOutcome, Dispatcher};
    use crate::testing::*;

    fn dispatcher() -> Dispatcher {
        let dispatcher = Dispatcher::builder("t!")
            .activity(
                Activity::builder(Route::parse("coin flip").unwrap())
                    .description("Flips a coin.")
                    .usage_description("Say ${absoluteReferencedRoute} to flip.")
                    .handle(noop),
            )
            .restricted_activity(
                Activity::builder(Route::parse("shutdown").unwrap())
                    .description("Stops the bot.")
                    .handle(noop),
            )
            .aliases([("flip", "coin flip"), ("toss", "coin flip")])
            .with_help()
            .build()
            .unwrap();
        dispatcher.rules().initialize_for_guild(GUILD, EVERYONE);
        dispatcher
    }

    async fn help(author: herald_core::UserId, text: &str) -> String {
        let dispatcher = dispatcher();
        let bot = MockBot::new();
        let event = MockEvent::new(author, text).boxed();
        assert_eq!(dispatcher.dispatch(event, bot.boxed()).await, DispatchOutcome::Completed);
        bot.last().unwrap()
    }

    #[tokio::test]
    async fn test_help_lists_accessible_commands() {
        let reply = help(MEMBER, "t!help").await;
        assert_eq!(
            reply,
            "Here's what I can do for you...\n\n\
             ``t!coin flip``    Flips a coin.\n\
             ``t!help [command]``    Shows what I can do.\n\
             \nYou can also say 't!help <command>' to get more help for that command. \
             This message will self-destruct in 3 minutes."
        );

        let reply = help(OWNER, "t!help").await;
        assert!(reply.contains("``t!shutdown``    Stops the bot."));
    }

    #[tokio::test]
    async fn test_help_describes_command() {
        let reply = help(MEMBER, "t!help flip").await;
        assert_eq!(
            reply,
            "**Command:** ``coin flip``\n\n**Aliases:**\n``flip``\n``toss``\n\nSay t!flip to flip."
        );
    }

    #[tokio::test]
    async fn test_help_edge_cases() {
        assert_eq!(help(MEMBER, "t!help help").await, "Very funny. :expressionless:");
        assert_eq!(help(MEMBER, "t!help nothing").await, "Sorry, that command doesn't exist.");
        assert_eq!(help(MEMBER, "t!help shutdown").await, "Sorry, that command doesn't exist.");
        assert_eq!(
            help(OWNER, "t!help shutdown").await,
            "**Command:** ``shutdown``\n\nNo additional usage information."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_help_cleans_up_after_itself() {
        let dispatcher = dispatcher();
        let bot = MockBot::new();

        let event = MockEvent::new(MEMBER, "t!help flip").boxed();
        assert_eq!(dispatcher.dispatch(event, bot.boxed()).await, DispatchOutcome::Completed);
        assert_eq!(bot.deleted(), [COMMAND_MESSAGE]);

        let event = MockEvent::new(MEMBER, "t!help").boxed();
        assert_eq!(dispatcher.dispatch(event, bot.boxed()).await, DispatchOutcome::Completed);
        assert_eq!(bot.deleted(), [COMMAND_MESSAGE, COMMAND_MESSAGE]);

        tokio::time::sleep(HELP_MESSAGE_TTL + HELP_MESSAGE_TTL / 10).await;
        assert_eq!(bot.deleted(), [COMMAND_MESSAGE, COMMAND_MESSAGE, "2"]);
    }

    #[test]
    fn test_help_is_public() {
        let dispatcher = dispatcher();
        let rules = dispatcher.rules().rules(GUILD);
        let help = rules
            .iter()
            .find(|r| r.path_expression().to_string() == "help")
            .unwrap();
        assert!(help.is_allow());
    }
}
