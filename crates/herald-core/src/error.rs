//! Error types shared across the Herald crates.
//!
//! Dispatch-level errors (usage, business, technical) are defined in
//! herald-framework. This module only covers the transport boundary.

use thiserror::Error;

// =============================================================================
// API Errors
// =============================================================================

/// Errors returned by a [`Bot`](crate::Bot) when talking to the chat platform.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot is not connected.
    #[error("bot is not connected")]
    NotConnected,

    /// The platform did not answer in time.
    #[error("API call timed out")]
    Timeout,

    /// The platform rejected the message.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The event carries no channel to answer in.
    #[error("missing session info: {0}")]
    MissingSession(String),

    /// The transport cannot perform the operation.
    #[error("{0} is not supported by this transport")]
    Unsupported(&'static str),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Creates a send failure.
    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    /// Creates a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Route Errors
// =============================================================================

/// Errors raised while building a [`Route`](crate::Route).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// A route needs at least one token.
    #[error("route must contain at least one token")]
    Empty,

    /// A token was empty or contained whitespace.
    #[error("invalid route token: {0:?}")]
    InvalidToken(String),
}
