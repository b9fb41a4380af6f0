//! Framework-level error types.
//!
//! Each layer returns its own error kind; only the dispatcher turns them into
//! text for the user:
//!
//! - [`ActivityError`]: what a handler (or binding) reports back
//! - [`PermissionError`]: rule store mutations that cannot be applied
//! - [`RegistrationError`]: activity sets rejected before dispatch starts

use herald_core::{ApiError, GuildId, Route, RouteError};
use thiserror::Error;

use crate::path::MalformedPathExpression;
use crate::request::{BindError, SchemaError};

/// A boxed error used for unexpected failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Activity Errors
// =============================================================================

/// Outcome of a failed activity invocation.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// Malformed or missing arguments. Answered with the usage string.
    #[error("{0}")]
    Usage(String),

    /// An expected failure whose message is shown verbatim.
    #[error("{0}")]
    Business(String),

    /// Anything else. Logged, and the user gets a generic apology.
    #[error("technical fault: {0}")]
    Technical(#[source] BoxError),
}

impl ActivityError {
    /// Creates a usage error.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Creates a business error.
    pub fn business(msg: impl Into<String>) -> Self {
        Self::Business(msg.into())
    }

    /// Wraps an unexpected failure.
    pub fn technical(err: impl Into<BoxError>) -> Self {
        Self::Technical(err.into())
    }
}

impl From<BindError> for ActivityError {
    fn from(err: BindError) -> Self {
        match err {
            BindError::Schema(e) => Self::technical(e),
            other => Self::Usage(other.to_string()),
        }
    }
}

impl From<MalformedPathExpression> for ActivityError {
    fn from(err: MalformedPathExpression) -> Self {
        Self::Usage(err.to_string())
    }
}

impl From<ApiError> for ActivityError {
    fn from(err: ApiError) -> Self {
        Self::technical(err)
    }
}

/// Result returned by activity handlers.
pub type ActivityResult = Result<(), ActivityError>;

// =============================================================================
// Permission Errors
// =============================================================================

/// Errors raised by [`RuleStore`](crate::permission::RuleStore) mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The guild has no permission configuration yet.
    #[error("no permission configuration found for guild {0}")]
    UnknownGuild(GuildId),

    /// The rule index does not exist.
    #[error("rule index {index} is out of bounds (guild has {len} rules)")]
    IndexOutOfBounds {
        /// Requested zero-based index.
        index: usize,
        /// Number of rules in the guild.
        len: usize,
    },
}

/// Result type for permission operations.
pub type PermissionResult<T> = Result<T, PermissionError>;

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while assembling the activity set.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Two activities share a canonical route.
    #[error("duplicate activity route `{0}`")]
    DuplicateRoute(Route),

    /// A built-in route could not be constructed.
    #[error("invalid route: {0}")]
    InvalidRoute(#[from] RouteError),

    /// A request schema failed validation.
    #[error("invalid request schema for `{route}`: {source}")]
    InvalidSchema {
        /// Route of the offending activity.
        route: Route,
        /// The validation failure.
        source: SchemaError,
    },
}

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
