//! Route matching.
//!
//! The router picks the activity whose route is the longest prefix of the
//! input tokens. Aliases are consulted first; canonical routes are only tried
//! when no alias matches. Among equally long matches the activity registered
//! first wins.

use std::sync::Arc;

use herald_core::Route;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::activity::Activity;
use crate::alias::AliasRegistry;
use crate::error::{RegistrationError, RegistrationResult};

/// The outcome of a successful match.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched activity.
    pub activity: Arc<Activity>,
    /// The route that matched the input: the canonical route or an alias.
    pub matched: Route,
    /// Whether `matched` is an alias.
    pub via_alias: bool,
}

/// Registered activities plus their aliases.
#[derive(Debug)]
pub struct Router {
    activities: RwLock<Arc<Vec<Arc<Activity>>>>,
    aliases: AliasRegistry,
}

impl Router {
    /// Creates a router, rejecting duplicate canonical routes.
    pub fn new<I, K, V>(activities: Vec<Activity>, aliases: I) -> RegistrationResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut registered: Vec<Arc<Activity>> = Vec::with_capacity(activities.len());
        for activity in activities {
            ensure_unique(&registered, activity.route())?;
            registered.push(Arc::new(activity));
        }

        let aliases = AliasRegistry::new(aliases, &registered);
        debug!(activities = registered.len(), aliases = aliases.len(), "Router created");
        Ok(Self {
            activities: RwLock::new(Arc::new(registered)),
            aliases,
        })
    }

    /// Adds an activity after startup.
    ///
    /// The activity set is replaced whole and the alias indices are rebuilt.
    pub fn register(&self, activity: Activity) -> RegistrationResult<Arc<Activity>> {
        let mut current = self.activities.write();
        ensure_unique(&current, activity.route())?;

        let activity = Arc::new(activity);
        let mut next = Vec::clone(&current);
        next.push(Arc::clone(&activity));
        let next = Arc::new(next);

        self.aliases.update(&next);
        *current = next;
        debug!(route = %activity.route(), "Activity registered");
        Ok(activity)
    }

    /// The current activity set, in registration order.
    pub fn activities(&self) -> Arc<Vec<Arc<Activity>>> {
        Arc::clone(&self.activities.read())
    }

    /// The activity with canonical route `route`.
    pub fn find(&self, route: &Route) -> Option<Arc<Activity>> {
        self.activities.read().iter().find(|a| a.route() == route).cloned()
    }

    pub fn aliases(&self) -> &AliasRegistry {
        &self.aliases
    }

    /// Finds the best activity for `tokens`.
    pub fn match_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Option<RouteMatch> {
        let activities = self.activities();

        let mut best: Option<RouteMatch> = None;
        for activity in activities.iter() {
            for alias in self.aliases.aliases_of(activity.route()) {
                if longer_prefix(&alias, tokens, best.as_ref()) {
                    best = Some(RouteMatch {
                        activity: Arc::clone(activity),
                        matched: alias,
                        via_alias: true,
                    });
                }
            }
        }
        if best.is_none() {
            for activity in activities.iter() {
                if longer_prefix(activity.route(), tokens, best.as_ref()) {
                    best = Some(RouteMatch {
                        activity: Arc::clone(activity),
                        matched: activity.route().clone(),
                        via_alias: false,
                    });
                }
            }
        }

        if let Some(m) = &best {
            trace!(
                route = %m.activity.route(),
                matched = %m.matched,
                via_alias = m.via_alias,
                "Route matched"
            );
        }
        best
    }
}

fn ensure_unique(activities: &[Arc<Activity>], route: &Route) -> RegistrationResult<()> {
    if activities.iter().any(|a| a.route() == route) {
        return Err(RegistrationError::DuplicateRoute(route.clone()));
    }
    Ok(())
}

fn longer_prefix<S: AsRef<str>>(
    candidate: &Route,
    tokens: &[S],
    best: Option<&RouteMatch>,
) -> bool {
    candidate.is_prefix_of(tokens) && best.is_none_or(|b| candidate.len() > b.matched.len())
}

/// Drops the first `count` whitespace-separated tokens from `text`.
///
/// Whitespace inside the remainder is preserved; leading whitespace is not.
pub fn strip_leading_tokens(text: &str, count: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..count {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}
