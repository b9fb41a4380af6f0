//! Route aliases.
//!
//! An alias is an alternative route that reaches an activity's canonical
//! route. The configured map is kept verbatim; the lookup indices are derived
//! from it and the current activity set, and are swapped whole whenever the
//! activity set changes. Aliases whose target is not (yet) registered stay in
//! the configuration and come alive once the target appears.
//!
//! Alias text is case-insensitive, so `Flip` and `flip` are the same alias.
//! When the configuration names an alias twice, the first entry is kept.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use herald_core::Route;
use parking_lot::RwLock;
use tracing::debug;

use crate::activity::Activity;

#[derive(Debug, Default)]
struct AliasIndex {
    forward: HashMap<Route, Arc<Activity>>,
    by_activity: HashMap<Route, Vec<Route>>,
}

impl AliasIndex {
    fn build(config: &[(Route, Route)], activities: &[Arc<Activity>]) -> Self {
        let mut index = Self::default();
        for (alias, target) in config {
            let Some(activity) = activities.iter().find(|a| a.route() == target) else {
                debug!(alias = %alias, target = %target, "Alias target is not registered");
                continue;
            };
            index.forward.insert(alias.clone(), Arc::clone(activity));
            index
                .by_activity
                .entry(target.clone())
                .or_default()
                .push(alias.clone());
        }
        for aliases in index.by_activity.values_mut() {
            aliases.sort_by_cached_key(Route::to_string);
        }
        index
    }
}

/// Bidirectional alias lookup.
#[derive(Debug)]
pub struct AliasRegistry {
    config: Vec<(Route, Route)>,
    index: RwLock<Arc<AliasIndex>>,
}

impl AliasRegistry {
    /// Parses `aliases` (alias text → canonical route text) and indexes them
    /// against `activities`. Unparseable and repeated entries are dropped.
    pub fn new<I, K, V>(aliases: I, activities: &[Arc<Activity>]) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let config: Vec<(Route, Route)> = aliases
            .into_iter()
            .filter_map(|(alias, target)| {
                match (Route::parse(alias.as_ref()), Route::parse(target.as_ref())) {
                    (Ok(alias), Ok(target)) => Some((alias, target)),
                    (alias_result, target_result) => {
                        debug!(
                            alias = alias.as_ref(),
                            target = target.as_ref(),
                            alias_ok = alias_result.is_ok(),
                            target_ok = target_result.is_ok(),
                            "Dropping unparseable alias"
                        );
                        None
                    }
                }
            })
            .filter(|(alias, target)| {
                let first = seen.insert(alias.clone());
                if !first {
                    debug!(alias = %alias, target = %target, "Dropping repeated alias");
                }
                first
            })
            .collect();

        let index = AliasIndex::build(&config, activities);
        Self {
            config,
            index: RwLock::new(Arc::new(index)),
        }
    }

    /// A registry with no aliases.
    pub fn empty() -> Self {
        Self::new(std::iter::empty::<(&str, &str)>(), &[])
    }

    /// The activity `alias` points to.
    pub fn resolve(&self, alias: &Route) -> Option<Arc<Activity>> {
        self.index.read().forward.get(alias).cloned()
    }

    /// Aliases of the activity at `route`, in lexicographic order.
    pub fn aliases_of(&self, route: &Route) -> Vec<Route> {
        self.index
            .read()
            .by_activity
            .get(route)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live aliases.
    pub fn len(&self) -> usize {
        self.index.read().forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds the indices for a new activity set.
    pub fn update(&self, activities: &[Arc<Activity>]) {
        let index = Arc::new(AliasIndex::build(&self.config, activities));
        debug!(aliases = index.forward.len(), "Alias index rebuilt");
        *self.index.write() = index;
    }
}

impl Default for AliasRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::noop;

    fn activity(route: &str) -> Arc<Activity> {
        Arc::new(Activity::builder(Route::parse(route).unwrap()).handle(noop))
    }

    fn route(text: &str) -> Route {
        Route::parse(text).unwrap()
    }

    fn target(registry: &AliasRegistry, alias: &str) -> Option<String> {
        registry.resolve(&route(alias)).map(|a| a.route().to_string())
    }

    #[test]
    fn test_resolve_and_reverse_lookup() {
        let activities = vec![activity("coin flip"), activity("help")];
        let registry = AliasRegistry::new(
            [("flip", "coin flip"), ("toss", "coin flip"), ("h", "help")],
            &activities,
        );

        let flip = registry.resolve(&route("flip")).unwrap();
        assert!(Arc::ptr_eq(&flip, &activities[0]));
        assert!(registry.resolve(&route("coin flip")).is_none());
        assert_eq!(registry.aliases_of(&route("coin flip")), [route("flip"), route("toss")]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_targets_revive_on_update() {
        let mut activities = vec![activity("ping")];
        let registry =
            AliasRegistry::new([("p", "ping"), ("?", "help"), ("  ", "ping")], &activities);
        assert_eq!(registry.len(), 1);
        assert_eq!(target(&registry, "?"), None);

        activities.push(activity("help"));
        registry.update(&activities);
        assert_eq!(target(&registry, "?").as_deref(), Some("help"));
        assert_eq!(registry.aliases_of(&route("help")), [route("?")]);
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        let activities = vec![activity("ping")];
        let registry = AliasRegistry::new([("PONG", "Ping")], &activities);
        assert_eq!(target(&registry, "pong").as_deref(), Some("ping"));
    }

    #[test]
    fn test_repeated_alias_keeps_first_entry() {
        let activities = vec![activity("coin flip"), activity("ping")];
        let registry = AliasRegistry::new(
            [("Flip", "coin flip"), ("flip", "ping"), ("FLIP", "coin flip")],
            &activities,
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(target(&registry, "flip").as_deref(), Some("coin flip"));
        assert_eq!(registry.aliases_of(&route("coin flip")), [route("flip")]);
        assert!(registry.aliases_of(&route("ping")).is_empty());
    }

    #[test]
    fn test_repeated_alias_with_dormant_first_entry() {
        let mut activities = vec![activity("ping")];
        let registry = AliasRegistry::new([("x", "help"), ("X", "ping")], &activities);
        assert_eq!(target(&registry, "x"), None);
        assert!(registry.aliases_of(&route("ping")).is_empty());

        activities.push(activity("help"));
        registry.update(&activities);
        assert_eq!(target(&registry, "x").as_deref(), Some("help"));
    }
}
