//! The parser chain.
//!
//! A [`Parser`] consumes a value from the *front* of the argument text and
//! hands back what it did not use. The [`ParserChain`] asks each registered
//! parser in order and uses the first one that supports the requested type.
//!
//! ```rust,ignore
//! struct DurationParser;
//!
//! impl Parser for DurationParser {
//!     fn supports(&self, ty: &ParamType) -> bool {
//!         *ty == ParamType::Custom("duration")
//!     }
//!
//!     fn parse<'a>(&self, text: &'a str, ty: &ParamType, _ctx: &ParseContext<'_>)
//!         -> Result<ParseResult<'a>, ParseError>
//!     {
//!         // ...
//!     }
//! }
//!
//! let chain = ParserChain::default().with(DurationParser);
//! ```

use std::sync::Arc;

use herald_core::{Directory, GuildId};
use thiserror::Error;

use super::parsers;
use super::schema::ParamType;
use super::value::Value;

/// A parsed value plus the unconsumed rest of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult<'a> {
    pub value: Value,
    pub remaining: &'a str,
}

impl<'a> ParseResult<'a> {
    pub fn new(value: Value, remaining: &'a str) -> Self {
        Self { value, remaining }
    }
}

/// Raised when the input does not start with a value of the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The text at the front of the input is not of the expected type.
    #[error("Line parser encountered unexpected input which could not be parsed as {expected}.")]
    Unexpected {
        /// Type name with article, e.g. "an integer".
        expected: String,
    },

    /// No registered parser handles the type.
    #[error("No parser is registered for {0}.")]
    Unsupported(String),
}

impl ParseError {
    /// Creates an "unexpected input" error for `ty`.
    pub fn unexpected(ty: &ParamType) -> Self {
        Self::Unexpected {
            expected: ty.describe(),
        }
    }
}

/// Ambient information some parsers need, such as the guild for `@everyone`.
#[derive(Clone, Copy, Default)]
pub struct ParseContext<'a> {
    pub guild: Option<GuildId>,
    pub directory: Option<&'a dyn Directory>,
}

impl<'a> ParseContext<'a> {
    pub fn new(guild: Option<GuildId>, directory: &'a dyn Directory) -> Self {
        Self {
            guild,
            directory: Some(directory),
        }
    }
}

/// Consumes one value from the front of the input.
pub trait Parser: Send + Sync {
    /// Whether this parser handles `ty`.
    fn supports(&self, ty: &ParamType) -> bool;

    /// Parses a value anchored at the start of `text`.
    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError>;
}

/// An ordered set of parsers.
#[derive(Clone)]
pub struct ParserChain {
    parsers: Vec<Arc<dyn Parser>>,
}

impl Default for ParserChain {
    /// The chain with every built-in parser.
    fn default() -> Self {
        Self::empty()
            .with(parsers::IntegerParser)
            .with(parsers::FloatParser)
            .with(parsers::BooleanParser)
            .with(parsers::StringParser)
            .with(parsers::EnumParser)
            .with(parsers::RoleMentionParser)
            .with(parsers::UserMentionParser)
            .with(parsers::ChannelMentionParser)
            .with(parsers::CustomEmojiParser)
    }
}

impl ParserChain {
    /// A chain with no parsers.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Appends a parser. Earlier parsers take precedence.
    pub fn with(mut self, parser: impl Parser + 'static) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    /// Number of parsers.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Parses with the first parser that supports `ty`.
    pub fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        self.parsers
            .iter()
            .find(|p| p.supports(ty))
            .ok_or_else(|| ParseError::Unsupported(ty.describe()))?
            .parse(text, ty, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::CustomValue;

    struct Shout;

    impl Parser for Shout {
        fn supports(&self, ty: &ParamType) -> bool {
            *ty == ParamType::Custom("shout")
        }

        fn parse<'a>(
            &self,
            text: &'a str,
            ty: &ParamType,
            _ctx: &ParseContext<'_>,
        ) -> Result<ParseResult<'a>, ParseError> {
            let end = text.find(' ').unwrap_or(text.len());
            let word = &text[..end];
            if word.is_empty() || word.chars().any(char::is_lowercase) {
                return Err(ParseError::unexpected(ty));
            }
            Ok(ParseResult::new(Value::Custom(CustomValue::new(word.to_string())), &text[end..]))
        }
    }

    #[test]
    fn test_custom_parser_extends_chain() {
        let chain = ParserChain::default().with(Shout);
        let ctx = ParseContext::default();
        let ty = ParamType::Custom("shout");

        let result = chain.parse("HEY you", &ty, &ctx).unwrap();
        assert_eq!(result.remaining, " you");
        match result.value {
            Value::Custom(v) => {
                assert_eq!(v.downcast_ref::<String>().map(String::as_str), Some("HEY"))
            }
            other => panic!("unexpected value {other:?}"),
        }

        assert_eq!(
            chain.parse("hey", &ty, &ctx),
            Err(ParseError::Unexpected {
                expected: "a(n) shout".into()
            })
        );
    }

    #[test]
    fn test_unsupported_type() {
        let chain = ParserChain::empty();
        assert_eq!(
            chain.parse("1", &ParamType::Int, &ParseContext::default()),
            Err(ParseError::Unsupported("an integer".into()))
        );
    }

    #[test]
    fn test_first_supporting_parser_wins() {
        struct AlwaysSeven;

        impl Parser for AlwaysSeven {
            fn supports(&self, ty: &ParamType) -> bool {
                *ty == ParamType::Int
            }

            fn parse<'a>(
                &self,
                text: &'a str,
                _ty: &ParamType,
                _ctx: &ParseContext<'_>,
            ) -> Result<ParseResult<'a>, ParseError> {
                Ok(ParseResult::new(Value::Int(7), text))
            }
        }

        let chain = ParserChain::empty().with(AlwaysSeven).with(parsers::IntegerParser);
        let result = chain.parse("3", &ParamType::Int, &ParseContext::default()).unwrap();
        assert_eq!(result.value, Value::Int(7));
    }
}
