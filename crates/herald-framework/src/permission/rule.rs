//! Permission rules and per-guild configuration.

use herald_core::{Directory, GuildId, Member, RoleId, UserId};
use serde::{Deserialize, Serialize};

use crate::path::PathExpression;

/// Who a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    /// Every member holding the role.
    Role(RoleId),
    /// A single user.
    User(UserId),
}

impl Subject {
    /// Returns true if `member` is covered by this subject.
    pub fn includes(&self, member: &Member) -> bool {
        match self {
            Self::Role(role) => member.has_role(*role),
            Self::User(user) => member.user == *user,
        }
    }

    /// Human-readable name, resolved through the directory when possible.
    pub fn display_name(&self, directory: &dyn Directory) -> String {
        match self {
            Self::Role(role) => directory
                .role_name(*role)
                .unwrap_or_else(|| "<deleted role>".to_string()),
            Self::User(user) => format!("<@{user}>"),
        }
    }
}

/// An allow/deny decision for a path expression and subject within one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    path_expression: PathExpression,
    guild_id: GuildId,
    subject: Subject,
    allow: bool,
}

impl Rule {
    /// Creates a rule.
    pub fn new(
        path_expression: PathExpression,
        guild_id: GuildId,
        subject: Subject,
        allow: bool,
    ) -> Self {
        Self {
            path_expression,
            guild_id,
            subject,
            allow,
        }
    }

    /// Shorthand for a role-scoped rule.
    pub fn for_role(
        path_expression: PathExpression,
        guild_id: GuildId,
        role: RoleId,
        allow: bool,
    ) -> Self {
        Self::new(path_expression, guild_id, Subject::Role(role), allow)
    }

    pub fn path_expression(&self) -> &PathExpression {
        &self.path_expression
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn is_allow(&self) -> bool {
        self.allow
    }

    /// A rule applies when its expression matches the path and its subject
    /// covers the member.
    pub fn applies_to<S: AsRef<str>>(&self, path: &[S], member: &Member) -> bool {
        self.path_expression.matches(path) && self.subject.includes(member)
    }
}

fn default_allow() -> bool {
    true
}

/// The ordered rule list and fallback decision for one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfiguration {
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Decision used when no rule applies.
    #[serde(default = "default_allow")]
    pub default_allow: bool,
}

impl Default for GuildConfiguration {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default_allow: default_allow(),
        }
    }
}

impl GuildConfiguration {
    /// First applicable rule wins, otherwise `default_allow`.
    pub fn evaluate<S: AsRef<str>>(&self, path: &[S], member: &Member) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.applies_to(path, member))
            .map_or(self.default_allow, Rule::is_allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId::new(1);
    const MODS: RoleId = RoleId::new(10);

    fn rule(path: &str, subject: Subject, allow: bool) -> Rule {
        Rule::new(PathExpression::parse(path).unwrap(), GUILD, subject, allow)
    }

    #[test]
    fn test_first_matching_rule_decides() {
        let config = GuildConfiguration {
            rules: vec![rule("permissions **", Subject::Role(MODS), false)],
            default_allow: true,
        };
        let moderator = Member::new(UserId::new(5)).with_role(MODS);
        let regular = Member::new(UserId::new(6));

        assert!(!config.evaluate(&["permissions", "add"], &moderator));
        assert!(config.evaluate(&["permissions", "add"], &regular));
    }

    #[test]
    fn test_rule_order_matters() {
        let config = GuildConfiguration {
            rules: vec![
                rule("play", Subject::User(UserId::new(5)), true),
                rule("**", Subject::Role(MODS), false),
            ],
            default_allow: false,
        };
        let member = Member::new(UserId::new(5)).with_role(MODS);

        assert!(config.evaluate(&["play"], &member));
        assert!(!config.evaluate(&["stop"], &member));
    }

    #[test]
    fn test_fallback_to_default() {
        let config = GuildConfiguration {
            rules: Vec::new(),
            default_allow: false,
        };
        assert!(!config.evaluate(&["help"], &Member::new(UserId::new(1))));
        assert!(GuildConfiguration::default().default_allow);
    }

    #[test]
    fn test_round_trip_preserves_order_and_flag() {
        let config = GuildConfiguration {
            rules: vec![
                rule("help", Subject::Role(RoleId::new(1)), true),
                rule("permissions **", Subject::Role(MODS), false),
                rule("play *", Subject::User(UserId::new(77)), true),
            ],
            default_allow: false,
        };

        let json = serde_json::to_string(&config).unwrap();
        let back: GuildConfiguration = serde_json::from_str(&json).unwrap();

        assert_eq!(back, config);
        assert_eq!(back.rules[1].path_expression().to_string(), "permissions **");
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(rule("help", Subject::Role(MODS), true)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "pathExpression": "help",
                "guildId": 1,
                "subject": { "role": 10 },
                "allow": true
            })
        );
    }
}
