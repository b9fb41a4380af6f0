//! The rule store.
//!
//! [`RuleStore`] owns every guild's [`GuildConfiguration`] behind a single
//! reader/writer lock. Checks and listings share the read lock; mutations
//! take the write lock, so a change is visible to the very next check.
//!
//! ```rust,ignore
//! let store = RuleStore::new();
//! store.add_restricted_activity(Route::parse("permissions add")?);
//! store.initialize_for_guild(guild, everyone);
//!
//! if store.check_accessibility(&route, &member, Some(guild)) {
//!     // run the activity
//! }
//! ```

use std::collections::{BTreeMap, HashMap};

use herald_core::{GuildId, Member, RoleId, Route};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::rule::{GuildConfiguration, Rule};
use crate::error::{PermissionError, PermissionResult};
use crate::path::PathExpression;

#[derive(Debug, Default)]
struct StoreState {
    guilds: HashMap<GuildId, GuildConfiguration>,
    public_routes: Vec<Route>,
    restricted_routes: Vec<Route>,
}

/// Concurrency-safe store of per-guild permission rules.
#[derive(Debug, Default)]
pub struct RuleStore {
    state: RwLock<StoreState>,
}

impl RuleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with guild configurations.
    pub fn with_configs(configs: impl IntoIterator<Item = (GuildId, GuildConfiguration)>) -> Self {
        let store = Self::new();
        store.restore(configs);
        store
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    /// Decides whether `member` may use the activity at `route` in `guild`.
    ///
    /// Owners and administrators always pass. A missing or unknown guild
    /// denies.
    pub fn check_accessibility(
        &self,
        route: &Route,
        member: &Member,
        guild: Option<GuildId>,
    ) -> bool {
        if member.is_privileged() {
            return true;
        }
        let Some(guild) = guild else {
            return false;
        };

        let state = self.state.read();
        state
            .guilds
            .get(&guild)
            .is_some_and(|config| config.evaluate(route.tokens(), member))
    }

    /// Rules of `guild` in evaluation order. Empty for unknown guilds.
    pub fn rules(&self, guild: GuildId) -> Vec<Rule> {
        self.state
            .read()
            .guilds
            .get(&guild)
            .map(|c| c.rules.clone())
            .unwrap_or_default()
    }

    /// The fallback decision of `guild`. Unknown guilds report `false`.
    pub fn default_allow(&self, guild: GuildId) -> bool {
        self.state
            .read()
            .guilds
            .get(&guild)
            .is_some_and(|c| c.default_allow)
    }

    /// Whether `guild` has a configuration.
    pub fn is_initialized(&self, guild: GuildId) -> bool {
        self.state.read().guilds.contains_key(&guild)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Inserts `rule` at `index` in its guild's list.
    ///
    /// The guild configuration is created if needed. `index` may equal the
    /// current length to append.
    pub fn add(&self, index: usize, rule: Rule) -> PermissionResult<()> {
        let mut state = self.state.write();
        let guild = rule.guild_id();
        let len = state.guilds.get(&guild).map_or(0, |c| c.rules.len());
        if index > len {
            return Err(PermissionError::IndexOutOfBounds { index, len });
        }

        debug!(
            guild = %guild,
            index,
            path = %rule.path_expression(),
            allow = rule.is_allow(),
            "Adding permission rule"
        );
        state.guilds.entry(guild).or_default().rules.insert(index, rule);
        Ok(())
    }

    /// Removes and returns the rule at `index`.
    pub fn remove(&self, guild: GuildId, index: usize) -> PermissionResult<Rule> {
        let mut state = self.state.write();
        let config = state
            .guilds
            .get_mut(&guild)
            .ok_or(PermissionError::UnknownGuild(guild))?;
        let len = config.rules.len();
        if index >= len {
            return Err(PermissionError::IndexOutOfBounds { index, len });
        }

        debug!(guild = %guild, index, "Removing permission rule");
        Ok(config.rules.remove(index))
    }

    /// Sets the fallback decision of an initialized guild.
    pub fn set_default_allow(&self, guild: GuildId, allow: bool) -> PermissionResult<()> {
        let mut state = self.state.write();
        let config = state
            .guilds
            .get_mut(&guild)
            .ok_or(PermissionError::UnknownGuild(guild))?;
        config.default_allow = allow;
        debug!(guild = %guild, allow, "Default allowability changed");
        Ok(())
    }

    /// Seeds a guild the first time it is seen.
    ///
    /// Public activities get an allow rule and restricted activities a deny
    /// rule, both for the everyone role. Returns `false` if the guild was
    /// already initialized, in which case nothing changes.
    pub fn initialize_for_guild(&self, guild: GuildId, everyone: RoleId) -> bool {
        let mut state = self.state.write();
        if state.guilds.contains_key(&guild) {
            return false;
        }

        let seed = |routes: &[Route], allow: bool| {
            routes
                .iter()
                .map(move |route| {
                    Rule::for_role(PathExpression::exact(route), guild, everyone, allow)
                })
                .collect::<Vec<_>>()
        };
        let mut rules = seed(&state.public_routes, true);
        rules.extend(seed(&state.restricted_routes, false));

        info!(guild = %guild, rules = rules.len(), "Initialized permissions for guild");
        state.guilds.insert(
            guild,
            GuildConfiguration {
                rules,
                ..Default::default()
            },
        );
        true
    }

    /// Registers an activity that everyone may use by default.
    ///
    /// Affects guilds initialized from now on.
    pub fn add_public_activity(&self, route: Route) {
        let mut state = self.state.write();
        if !state.public_routes.contains(&route) {
            state.public_routes.push(route);
        }
    }

    /// Registers an activity that is denied to everyone by default.
    pub fn add_restricted_activity(&self, route: Route) {
        let mut state = self.state.write();
        if !state.restricted_routes.contains(&route) {
            state.restricted_routes.push(route);
        }
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Copies every guild configuration, ordered by guild id.
    pub fn snapshot(&self) -> BTreeMap<GuildId, GuildConfiguration> {
        self.state
            .read()
            .guilds
            .iter()
            .map(|(id, config)| (*id, config.clone()))
            .collect()
    }

    /// Replaces all guild configurations.
    pub fn restore(&self, configs: impl IntoIterator<Item = (GuildId, GuildConfiguration)>) {
        let mut state = self.state.write();
        state.guilds = configs.into_iter().collect();
        debug!(guilds = state.guilds.len(), "Permission rules restored");
    }
}
