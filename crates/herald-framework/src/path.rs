//! Wildcard path expressions.
//!
//! A [`PathExpression`] is a route pattern used by permission rules:
//!
//! - a literal segment matches the same token (case-insensitively)
//! - `*` matches exactly one token
//! - `**` matches zero or more trailing tokens and is only legal last
//!
//! ```rust,ignore
//! let exp = PathExpression::parse("permissions **")?;
//! assert!(exp.matches(&["permissions", "add"]));
//! assert!(!exp.matches(&["help"]));
//! ```

use std::fmt;
use std::str::FromStr;

use herald_core::Route;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const WILDCARD: &str = "*";
const DOUBLE_WILDCARD: &str = "**";

/// Raised when a path expression is constructed from invalid segments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedPathExpression {
    /// A segment was empty or contained whitespace.
    #[error("Path expressions must not contain blank components.")]
    BlankSegment,

    /// `**` appeared before the last position.
    #[error("Double wildcard is only permitted at the end of the path.")]
    MisplacedDoubleWildcard {
        /// Zero-based position of the offending segment.
        position: usize,
    },
}

/// One component of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches one token equal to the literal.
    Literal(String),
    /// `*`: matches any single token.
    Any,
    /// `**`: matches any number of trailing tokens.
    Rest,
}

impl Segment {
    fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) => s,
            Self::Any => WILDCARD,
            Self::Rest => DOUBLE_WILDCARD,
        }
    }
}

/// A route pattern with `*` and trailing `**` wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathExpression {
    segments: Vec<Segment>,
}

impl PathExpression {
    /// Builds an expression from raw segments.
    pub fn new<I, S>(segments: I) -> Result<Self, MalformedPathExpression>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<S> = segments.into_iter().collect();
        let last = raw.len().saturating_sub(1);
        let mut out = Vec::with_capacity(raw.len());

        for (position, segment) in raw.iter().enumerate() {
            let segment = segment.as_ref();
            if segment.is_empty() || segment.chars().any(char::is_whitespace) {
                return Err(MalformedPathExpression::BlankSegment);
            }
            out.push(match segment {
                DOUBLE_WILDCARD if position != last => {
                    return Err(MalformedPathExpression::MisplacedDoubleWildcard { position });
                }
                DOUBLE_WILDCARD => Segment::Rest,
                WILDCARD => Segment::Any,
                literal => Segment::Literal(literal.to_lowercase()),
            });
        }

        Ok(Self { segments: out })
    }

    /// Parses a space-separated expression. Blank input yields the empty expression.
    pub fn parse(text: &str) -> Result<Self, MalformedPathExpression> {
        Self::new(text.split_whitespace())
    }

    /// The expression that matches exactly `route`.
    pub fn exact(route: &Route) -> Self {
        Self {
            segments: route
                .tokens()
                .iter()
                .map(|t| Segment::Literal(t.clone()))
                .collect(),
        }
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true for the expression with no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Checks whether this expression matches `path`.
    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        let (effective, open_ended) = match self.segments.split_last() {
            None => return path.is_empty(),
            Some((Segment::Rest, head)) => (head, true),
            Some(_) => (self.segments.as_slice(), false),
        };

        if path.len() < effective.len() || (path.len() > effective.len() && !open_ended) {
            return false;
        }

        effective.iter().zip(path).all(|(segment, token)| match segment {
            Segment::Any => true,
            Segment::Literal(lit) => *lit == token.as_ref().to_lowercase(),
            // `**` never survives outside the last position.
            Segment::Rest => false,
        })
    }

    /// Checks whether this expression matches a route.
    pub fn matches_route(&self, route: &Route) -> bool {
        self.matches(route.tokens())
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(segment.as_str())?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = MalformedPathExpression;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathExpression {
    type Error = MalformedPathExpression;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathExpression> for String {
    fn from(exp: PathExpression) -> Self {
        exp.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(s: &str) -> PathExpression {
        PathExpression::parse(s).unwrap()
    }

    #[test]
    fn test_double_wildcard_matches_trailing_tokens() {
        let e = exp("a b **");
        assert!(e.matches(&["a", "b"]));
        assert!(e.matches(&["a", "b", "c"]));
        assert!(e.matches(&["a", "b", "c", "d"]));
        assert!(!e.matches(&["a"]));
        assert!(!e.matches(&["a", "x", "c"]));
    }

    #[test]
    fn test_single_wildcard_matches_one_token() {
        let e = exp("a *");
        assert!(e.matches(&["a", "x"]));
        assert!(!e.matches(&["a", "x", "y"]));
        assert!(!e.matches(&["a"]));
    }

    #[test]
    fn test_literal_requires_exact_length() {
        let e = exp("permissions add");
        assert!(e.matches(&["permissions", "add"]));
        assert!(e.matches(&["Permissions", "ADD"]));
        assert!(!e.matches(&["permissions"]));
        assert!(!e.matches(&["permissions", "add", "x"]));
    }

    #[test]
    fn test_empty_expression_matches_only_empty_path() {
        let e = exp("   ");
        assert!(e.is_empty());
        assert!(e.matches::<&str>(&[]));
        assert!(!e.matches(&["a"]));
    }

    #[test]
    fn test_lone_double_wildcard_matches_everything() {
        let e = exp("**");
        assert!(e.matches::<&str>(&[]));
        assert!(e.matches(&["anything", "at", "all"]));
    }

    #[test]
    fn test_misplaced_double_wildcard_is_rejected() {
        assert_eq!(
            PathExpression::parse("** a"),
            Err(MalformedPathExpression::MisplacedDoubleWildcard { position: 0 })
        );
        assert!(PathExpression::parse("a ** b").is_err());
    }

    #[test]
    fn test_blank_segment_is_rejected() {
        assert_eq!(
            PathExpression::new(["a", " "]),
            Err(MalformedPathExpression::BlankSegment)
        );
    }

    #[test]
    fn test_display_and_serde() {
        let e = exp("permissions *  **");
        assert_eq!(e.to_string(), "permissions * **");

        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, "\"permissions * **\"");
        let back: PathExpression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);

        assert!(serde_json::from_str::<PathExpression>("\"** x\"").is_err());
    }

    #[test]
    fn test_exact_route_expression() {
        let route = Route::parse("help").unwrap();
        let e = PathExpression::exact(&route);
        assert!(e.matches_route(&route));
        assert!(!e.matches(&["help", "more"]));
    }
}
