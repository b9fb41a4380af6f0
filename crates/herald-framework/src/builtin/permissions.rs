//! Permission administration commands.

use herald_core::{GuildId, RoleId, Route, RouteError};

use crate::activity::{Activity, CommandContext};
use crate::error::{ActivityError, ActivityResult, PermissionError};
use crate::path::PathExpression;
use crate::permission::{Rule, render_rules};
use crate::{ParamEnum, Request};

/// Whether a rule grants or withholds access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ParamEnum)]
pub enum Allowability {
    Allow,
    Deny,
}

impl Allowability {
    pub fn is_allow(self) -> bool {
        self == Self::Allow
    }
}

#[derive(Debug, Request)]
struct AddRuleRequest {
    #[param(ordinal = 0, description = "The position to insert the rule at.")]
    index: i32,

    #[param(ordinal = 1, description = "A role mention.")]
    role: RoleId,

    #[param(
        name = "allow/deny",
        ordinal = 2,
        description = "To allow or deny access to the given role."
    )]
    allowability: Allowability,

    #[param(
        name = "route path expression",
        ordinal = 3,
        description = "The command, or a pattern of commands, the rule applies to.",
        capture_remaining
    )]
    path: Option<String>,
}

#[derive(Debug, Request)]
struct DeleteRuleRequest {
    #[param(ordinal = 0, description = "The position of the rule to delete.")]
    index: i32,
}

#[derive(Debug, Request)]
struct SetDefaultRequest {
    #[param(
        name = "allow/deny",
        ordinal = 0,
        description = "Whether commands no rule matches are allowed."
    )]
    allowability: Allowability,
}

const ADD_USAGE: &str = "Adds a rule at the given ``index`` which allows or denies the ``role`` to use \
command(s) that satisfy a ``route path expression``.\n\n\
**Arguments**:\n\n\
``index`` - The index to insert the rule at as shown by the ``permissions list`` command.\n\
``role`` - A role mention.\n\
``allow/deny`` - Must be either 'allow' or 'deny'\n\
``route path expression`` - The command name or some expression to allow or deny for the given role. \
This route must be the natural route, not an alias. A path expression may contain wildcards ``*`` or ``**``.\n\n\
**Examples:**\n\n\
```${absoluteReferencedRoute} 1 @somerole deny permissions **```\n\
This would deny all users in ``@somerole`` from being able to use commands that *start with* ``permissions``\n\n\
```${absoluteReferencedRoute} 1 @somerole allow help```\n\
This would allow all users in ``@somerole`` to use the ``help`` command.\n";

/// The `permissions` activities.
pub fn permission_activities() -> Result<Vec<Activity>, RouteError> {
    Ok(vec![
        Activity::builder(Route::new(["permissions", "add"])?)
            .description("Add a rule for this server.")
            .usage_description(ADD_USAGE)
            .handle_request(add_rule),
        Activity::builder(Route::new(["permissions", "delete"])?)
            .description("Deletes a rule for this server.")
            .usage_description(
                "Use the ``permissions list`` command to see all the rules and then pick a rule \
                 to delete with ``permissions delete``.",
            )
            .handle_request(delete_rule),
        Activity::builder(Route::new(["permissions", "setdefault"])?)
            .description(
                "Sets whether commands should be allowed or denied when they don't match a rule.",
            )
            .handle_request(set_default),
        Activity::builder(Route::new(["permissions", "list"])?)
            .description("Shows permissions for this server.")
            .handle(list_rules),
    ])
}

fn require_guild(ctx: &CommandContext) -> Result<GuildId, ActivityError> {
    ctx.guild()
        .ok_or_else(|| ActivityError::business("This command can only be used in a server."))
}

fn listing(ctx: &CommandContext, guild: GuildId) -> String {
    let rules = ctx.dispatcher().rules();
    render_rules(&rules.rules(guild), rules.default_allow(guild), ctx.bot().directory())
}

/// Converts a 1-based display index.
fn zero_based(display_index: i32) -> Option<usize> {
    usize::try_from(display_index).ok()?.checked_sub(1)
}

async fn add_rule(ctx: CommandContext, request: AddRuleRequest) -> ActivityResult {
    let guild = require_guild(&ctx)?;
    let path = PathExpression::parse(request.path.as_deref().unwrap_or_default())?;
    let index = zero_based(request.index)
        .ok_or_else(|| ActivityError::usage("The index argument must be positive."))?;

    let rule = Rule::for_role(path, guild, request.role, request.allowability.is_allow());
    ctx.dispatcher()
        .rules()
        .add(index, rule)
        .map_err(|_| ActivityError::usage("Index was not valid."))?;

    ctx.reply(&format!("Rule was successfully added.\n\n{}", listing(&ctx, guild)))
        .await
}

async fn delete_rule(ctx: CommandContext, request: DeleteRuleRequest) -> ActivityResult {
    const INVALID_INDEX: &str = "The index is invalid.";

    let guild = require_guild(&ctx)?;
    let index = zero_based(request.index).ok_or_else(|| ActivityError::usage(INVALID_INDEX))?;
    match ctx.dispatcher().rules().remove(guild, index) {
        Ok(_) => {}
        Err(PermissionError::IndexOutOfBounds { .. }) => {
            return Err(ActivityError::usage(INVALID_INDEX));
        }
        Err(PermissionError::UnknownGuild(_)) => {
            return Err(ActivityError::business(
                "This server has no permission rules to delete yet.",
            ));
        }
    }

    ctx.reply(&format!("Rule was successfully removed.\n\n{}", listing(&ctx, guild)))
        .await
}

async fn set_default(ctx: CommandContext, request: SetDefaultRequest) -> ActivityResult {
    let guild = require_guild(&ctx)?;
    ctx.dispatcher()
        .rules()
        .set_default_allow(guild, request.allowability.is_allow())
        .map_err(|e| ActivityError::business(e.to_string()))?;

    ctx.reply(&format!(
        "The default allowability has been set to **{}**.",
        request.allowability.variant_name()
    ))
    .await
}

async fn list_rules(ctx: CommandContext) -> ActivityResult {
    let guild = require_guild(&ctx)?;
    ctx.reply_private(&listing(&ctx, guild)).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herald_core::UserId;

    use crate::dispatcher::{DispatchOutcome, Dispatcher};
    use crate::testing::*;

    fn dispatcher() -> Dispatcher {
        let dispatcher = Dispatcher::builder("t!").with_permission_commands().build().unwrap();
        dispatcher.rules().initialize_for_guild(GUILD, EVERYONE);
        dispatcher
    }

    async fn send(
        dispatcher: &Dispatcher,
        bot: &Arc<MockBot>,
        author: UserId,
        text: &str,
    ) -> DispatchOutcome {
        dispatcher.dispatch(MockEvent::new(author, text).boxed(), bot.boxed()).await
    }

    #[tokio::test]
    async fn test_permission_commands_are_restricted() {
        let dispatcher = dispatcher();
        let bot = MockBot::new();
        assert_eq!(
            send(&dispatcher, &bot, MEMBER, "t!permissions list").await,
            DispatchOutcome::Denied
        );
        assert_eq!(dispatcher.rules().rules(GUILD).len(), 4);
        assert!(dispatcher.rules().rules(GUILD).iter().all(|r| !r.is_allow()));
    }

    #[tokio::test]
    async fn test_add_rule() {
        let dispatcher = dispatcher();
        let bot = MockBot::new();
        let text = "t!permissions add 1 <@&50> allow permissions **";
        let outcome = send(&dispatcher, &bot, OWNER, text).await;
        assert_eq!(outcome, DispatchOutcome::Completed);

        let reply = bot.last().unwrap();
        assert!(reply.starts_with(
            "Rule was successfully added.\n\n[``1``] ``permissions **`` **CAN** be used by ``moderators``\n"
        ));

        let rules = dispatcher.rules().rules(GUILD);
        assert_eq!(rules.len(), 5);
        assert_eq!(rules[0].path_expression().to_string(), "permissions **");

        assert_eq!(
            send(&dispatcher, &bot, MODERATOR, "t!permissions list").await,
            DispatchOutcome::Completed
        );
        assert!(bot.sent().last().unwrap().private);
    }

    #[tokio::test]
    async fn test_add_rule_rejects_bad_input() {
        let dispatcher = dispatcher();
        let bot = MockBot::new();

        assert_eq!(
            send(&dispatcher, &bot, OWNER, "t!permissions add 9 <@&50> allow help").await,
            DispatchOutcome::UsageError
        );
        assert!(bot.last().unwrap().starts_with("Index was not valid.\n\nUsage:\n"));

        assert_eq!(
            send(&dispatcher, &bot, OWNER, "t!permissions add 0 <@&50> allow help").await,
            DispatchOutcome::UsageError
        );
        assert!(bot.last().unwrap().starts_with("The index argument must be positive."));

        assert_eq!(
            send(&dispatcher, &bot, OWNER, "t!permissions add 1 <@&50> deny ** help").await,
            DispatchOutcome::UsageError
        );
        assert!(
            bot.last()
                .unwrap()
                .starts_with("Double wildcard is only permitted at the end of the path.")
        );

        assert_eq!(
            send(&dispatcher, &bot, OWNER, "t!permissions add 1 <@&50>").await,
            DispatchOutcome::UsageError
        );
        assert_eq!(
            bot.last().unwrap(),
            "Missing argument `allow/deny`: To allow or deny access to the given role.\n\n\
             Usage:\n``t!permissions add <index> <role> <allow/deny> [route path expression]``"
        );
        assert_eq!(dispatcher.rules().rules(GUILD).len(), 4);
    }

    #[tokio::test]
    async fn test_delete_rule() {
        let dispatcher = dispatcher();
        let bot = MockBot::new();
        assert_eq!(
            send(&dispatcher, &bot, ADMIN, "t!permissions delete 1").await,
            DispatchOutcome::Completed
        );
        assert!(bot.last().unwrap().starts_with("Rule was successfully removed.\n\n"));
        assert_eq!(dispatcher.rules().rules(GUILD).len(), 3);

        assert_eq!(
            send(&dispatcher, &bot, ADMIN, "t!permissions delete 42").await,
            DispatchOutcome::UsageError
        );
        assert!(bot.last().unwrap().starts_with("The index is invalid."));

        assert_eq!(
            send(&dispatcher, &bot, ADMIN, "t!permissions delete 0").await,
            DispatchOutcome::UsageError
        );
        assert!(bot.last().unwrap().starts_with("The index is invalid."));
    }

    #[tokio::test]
    async fn test_delete_rule_in_unknown_guild() {
        let dispatcher = Dispatcher::builder("t!").with_permission_commands().build().unwrap();
        let bot = MockBot::new();
        assert_eq!(
            send(&dispatcher, &bot, OWNER, "t!permissions delete 1").await,
            DispatchOutcome::BusinessError
        );
        assert_eq!(
            bot.last().as_deref(),
            Some("This server has no permission rules to delete yet.")
        );
    }

    #[tokio::test]
    async fn test_set_default() {
        let dispatcher = dispatcher();
        let bot = MockBot::new();
        assert_eq!(
            send(&dispatcher, &bot, OWNER, "t!permissions setdefault DENY").await,
            DispatchOutcome::Completed
        );
        assert_eq!(
            bot.last().as_deref(),
            Some("The default allowability has been set to **DENY**.")
        );
        assert!(!dispatcher.rules().default_allow(GUILD));
    }
}
