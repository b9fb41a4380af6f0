//! Command routes.
//!
//! A [`Route`] is the ordered token sequence that names a command, such as
//! `permissions add`. Routes are stored lowercase and compared structurally;
//! incoming message tokens are compared case-insensitively.
//!
//! ```rust,ignore
//! let route: Route = "Permissions Add".parse()?;
//! assert_eq!(route.to_string(), "permissions add");
//! assert!(route.is_prefix_of(&["permissions", "ADD", "1"]));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;

/// An ordered, non-empty sequence of lowercase tokens identifying a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Route(Vec<String>);

impl Route {
    /// Builds a route from individual tokens.
    ///
    /// Tokens are lowercased. Empty tokens and tokens containing whitespace
    /// are rejected, as is an empty token list.
    pub fn new<I, S>(tokens: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for token in tokens {
            let token = token.as_ref();
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                return Err(RouteError::InvalidToken(token.to_string()));
            }
            out.push(token.to_lowercase());
        }
        if out.is_empty() {
            return Err(RouteError::Empty);
        }
        Ok(Self(out))
    }

    /// Parses a whitespace-separated route string.
    pub fn parse(text: &str) -> Result<Self, RouteError> {
        Self::new(text.split_whitespace())
    }

    /// Returns the route tokens.
    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Routes are never empty once constructed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true when this route equals the first `self.len()` input tokens.
    pub fn is_prefix_of<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        tokens.len() >= self.0.len()
            && self
                .0
                .iter()
                .zip(tokens)
                .all(|(own, other)| *own == other.as_ref().to_lowercase())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Route {
    type Error = RouteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Route> for String {
    fn from(route: Route) -> Self {
        route.to_string()
    }
}
