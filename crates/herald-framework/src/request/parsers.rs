//! Built-in parsers.
//!
//! Every parser anchors at the first character of its input. None of them
//! skips leading garbage: the binder trims whitespace between arguments, so
//! anything else at the front is an error.

use herald_core::{ChannelId, EmojiId, RoleId, UserId};

use super::parser::{ParseContext, ParseError, ParseResult, Parser};
use super::schema::ParamType;
use super::value::{CustomEmoji, Value};

// =============================================================================
// Scanning helpers
// =============================================================================

/// Length of a leading `[0-9]+` run.
fn digits(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_digit).count()
}

/// Length of a leading `-?[0-9]+`.
fn scan_integer(text: &str) -> Option<usize> {
    let sign = usize::from(text.starts_with('-'));
    let n = digits(&text[sign..]);
    (n > 0).then_some(sign + n)
}

/// Length of a leading decimal literal: `-?[0-9]*(\.[0-9]*)?` with at least one digit.
fn scan_decimal(text: &str) -> Option<usize> {
    let sign = usize::from(text.starts_with('-'));
    let int_part = digits(&text[sign..]);
    let mut end = sign + int_part;
    let mut frac_part = 0;
    if text[end..].starts_with('.') {
        frac_part = digits(&text[end + 1..]);
        end += 1 + frac_part;
    }
    (int_part + frac_part > 0).then_some(end)
}

/// Splits off a leading run of non-whitespace.
fn split_word(text: &str) -> Option<(&str, &str)> {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    (end > 0).then(|| text.split_at(end))
}

/// Splits off a quoted string, unescaping `\<quote>`.
fn split_quoted(text: &str) -> Option<(String, &str)> {
    let quote = text.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &text[quote.len_utf8()..];

    let mut content = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' && body[i + 1..].starts_with(quote) {
            content.push(quote);
            chars.next();
        } else if c == quote {
            return Some((content, &body[i + c.len_utf8()..]));
        } else {
            content.push(c);
        }
    }
    None
}

/// Parses `<{open}ID>` and returns the id and the remaining text.
fn split_tagged_id<'a>(text: &'a str, open: &str) -> Option<(u64, &'a str)> {
    let rest = text.strip_prefix(open)?;
    let n = digits(rest);
    if n == 0 {
        return None;
    }
    let remaining = rest[n..].strip_prefix('>')?;
    rest[..n].parse().ok().map(|id| (id, remaining))
}

fn split_any_tagged_id<'a>(text: &'a str, opens: &[&str]) -> Option<(u64, &'a str)> {
    opens.iter().find_map(|open| split_tagged_id(text, open))
}

// =============================================================================
// Numbers
// =============================================================================

/// `-?[0-9]+` into int, long or short, range-checked.
pub struct IntegerParser;

impl Parser for IntegerParser {
    fn supports(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Int | ParamType::Long | ParamType::Short)
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        let end = scan_integer(text).ok_or_else(|| ParseError::unexpected(ty))?;
        let (literal, remaining) = text.split_at(end);
        let value = match ty {
            ParamType::Int => literal.parse().ok().map(Value::Int),
            ParamType::Long => literal.parse().ok().map(Value::Long),
            ParamType::Short => literal.parse().ok().map(Value::Short),
            _ => None,
        };
        value
            .map(|v| ParseResult::new(v, remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

/// Decimal literals into float or double.
pub struct FloatParser;

impl Parser for FloatParser {
    fn supports(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Float | ParamType::Double)
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        let end = scan_decimal(text).ok_or_else(|| ParseError::unexpected(ty))?;
        let (literal, remaining) = text.split_at(end);
        let value = match ty {
            ParamType::Float => literal.parse().ok().map(Value::Float),
            ParamType::Double => literal.parse().ok().map(Value::Double),
            _ => None,
        };
        value
            .map(|v| ParseResult::new(v, remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

// =============================================================================
// Booleans, text and enums
// =============================================================================

/// `true` / `false`, case-insensitive.
pub struct BooleanParser;

impl Parser for BooleanParser {
    fn supports(&self, ty: &ParamType) -> bool {
        *ty == ParamType::Bool
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        for (literal, value) in [("true", true), ("false", false)] {
            if let Some(head) = text.get(..literal.len())
                && head.eq_ignore_ascii_case(literal)
            {
                return Ok(ParseResult::new(Value::Bool(value), &text[literal.len()..]));
            }
        }
        Err(ParseError::unexpected(ty))
    }
}

/// A quoted string, else a single word.
pub struct StringParser;

impl Parser for StringParser {
    fn supports(&self, ty: &ParamType) -> bool {
        *ty == ParamType::Text
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        if let Some((content, remaining)) = split_quoted(text) {
            return Ok(ParseResult::new(Value::Text(content), remaining));
        }
        split_word(text)
            .map(|(word, remaining)| ParseResult::new(Value::Text(word.to_string()), remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

/// One word matched case-insensitively against the variant names.
pub struct EnumParser;

impl Parser for EnumParser {
    fn supports(&self, ty: &ParamType) -> bool {
        matches!(ty, ParamType::Enum { .. })
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        let ParamType::Enum { variants, .. } = ty else {
            return Err(ParseError::unexpected(ty));
        };
        let (word, remaining) = split_word(text).ok_or_else(|| ParseError::unexpected(ty))?;
        variants
            .iter()
            .find(|v| v.eq_ignore_ascii_case(word))
            .map(|v| ParseResult::new(Value::Enum(*v), remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

// =============================================================================
// Mentions
// =============================================================================

const EVERYONE: &str = "@everyone";

/// `<@&ID>`, `<role:ID>` or `@everyone`.
pub struct RoleMentionParser;

impl Parser for RoleMentionParser {
    fn supports(&self, ty: &ParamType) -> bool {
        *ty == ParamType::Role
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        if let Some((id, remaining)) = split_any_tagged_id(text, &["<@&", "<role:"]) {
            return Ok(ParseResult::new(Value::Role(RoleId::new(id)), remaining));
        }
        if let Some(remaining) = text.strip_prefix(EVERYONE)
            && let (Some(guild), Some(directory)) = (ctx.guild, ctx.directory)
        {
            let role = directory.everyone_role(guild);
            return Ok(ParseResult::new(Value::Role(role), remaining));
        }
        Err(ParseError::unexpected(ty))
    }
}

/// `<@ID>`, `<@!ID>` or `<user:ID>`.
pub struct UserMentionParser;

impl Parser for UserMentionParser {
    fn supports(&self, ty: &ParamType) -> bool {
        *ty == ParamType::User
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        split_any_tagged_id(text, &["<@!", "<@", "<user:"])
            .map(|(id, remaining)| ParseResult::new(Value::User(UserId::new(id)), remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

/// `<#ID>` or `<channel:ID>`.
pub struct ChannelMentionParser;

impl Parser for ChannelMentionParser {
    fn supports(&self, ty: &ParamType) -> bool {
        *ty == ParamType::Channel
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        split_any_tagged_id(text, &["<#", "<channel:"])
            .map(|(id, remaining)| ParseResult::new(Value::Channel(ChannelId::new(id)), remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

/// `<:name:ID>` or `<a:name:ID>`; names are two or more of `[A-Za-z0-9_]`.
pub struct CustomEmojiParser;

impl CustomEmojiParser {
    fn split(text: &str) -> Option<(CustomEmoji, &str)> {
        let (animated, rest) = match text.strip_prefix("<a:") {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix("<:")?),
        };
        let name_len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if name_len < 2 {
            return None;
        }
        let (name, rest) = rest.split_at(name_len);
        let (id, remaining) = split_tagged_id(rest, ":")?;
        Some((
            CustomEmoji {
                id: EmojiId::new(id),
                name: name.to_string(),
                animated,
            },
            remaining,
        ))
    }
}

impl Parser for CustomEmojiParser {
    fn supports(&self, ty: &ParamType) -> bool {
        *ty == ParamType::Emoji
    }

    fn parse<'a>(
        &self,
        text: &'a str,
        ty: &ParamType,
        _ctx: &ParseContext<'_>,
    ) -> Result<ParseResult<'a>, ParseError> {
        Self::split(text)
            .map(|(emoji, remaining)| ParseResult::new(Value::Emoji(emoji), remaining))
            .ok_or_else(|| ParseError::unexpected(ty))
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{Directory, GuildId};

    use super::*;

    fn parse<'a>(
        parser: &dyn Parser,
        text: &'a str,
        ty: ParamType,
    ) -> Result<ParseResult<'a>, ParseError> {
        parser.parse(text, &ty, &ParseContext::default())
    }

    #[test]
    fn test_integer_parser() {
        let r = parse(&IntegerParser, "-42 rest", ParamType::Int).unwrap();
        assert_eq!(r.value, Value::Int(-42));
        assert_eq!(r.remaining, " rest");

        let r = parse(&IntegerParser, "9000000000", ParamType::Long).unwrap();
        assert_eq!(r.value, Value::Long(9_000_000_000));

        assert!(parse(&IntegerParser, "70000", ParamType::Short).is_err());
        assert!(parse(&IntegerParser, " 1", ParamType::Int).is_err());
        assert!(parse(&IntegerParser, "x1", ParamType::Int).is_err());
        assert_eq!(
            parse(&IntegerParser, "abc", ParamType::Int).unwrap_err().to_string(),
            "Line parser encountered unexpected input which could not be parsed as an integer."
        );
    }

    #[test]
    fn test_float_parser() {
        let r = parse(&FloatParser, "1.5x", ParamType::Double).unwrap();
        assert_eq!(r.value, Value::Double(1.5));
        assert_eq!(r.remaining, "x");

        let r = parse(&FloatParser, "-.25", ParamType::Float).unwrap();
        assert_eq!(r.value, Value::Float(-0.25));

        let r = parse(&FloatParser, "3. next", ParamType::Double).unwrap();
        assert_eq!(r.value, Value::Double(3.0));
        assert_eq!(r.remaining, " next");

        let r = parse(&FloatParser, "7", ParamType::Double).unwrap();
        assert_eq!(r.value, Value::Double(7.0));

        assert!(parse(&FloatParser, ".", ParamType::Double).is_err());
        assert!(parse(&FloatParser, "-", ParamType::Double).is_err());
    }

    #[test]
    fn test_boolean_parser() {
        let r = parse(&BooleanParser, "TRUE later", ParamType::Bool).unwrap();
        assert_eq!(r.value, Value::Bool(true));
        assert_eq!(r.remaining, " later");
        assert_eq!(
            parse(&BooleanParser, "False", ParamType::Bool).unwrap().value,
            Value::Bool(false)
        );
        assert!(parse(&BooleanParser, "yes", ParamType::Bool).is_err());
    }

    #[test]
    fn test_string_parser_word_and_quotes() {
        let r = parse(&StringParser, "hello world", ParamType::Text).unwrap();
        assert_eq!(r.value, Value::Text("hello".into()));
        assert_eq!(r.remaining, " world");

        let r = parse(&StringParser, "\"hello world\" tail", ParamType::Text).unwrap();
        assert_eq!(r.value, Value::Text("hello world".into()));
        assert_eq!(r.remaining, " tail");

        let r = parse(&StringParser, r#"'it\'s fine' x"#, ParamType::Text).unwrap();
        assert_eq!(r.value, Value::Text("it's fine".into()));
        assert_eq!(r.remaining, " x");

        let r = parse(&StringParser, "\"unterminated quote", ParamType::Text).unwrap();
        assert_eq!(r.value, Value::Text("\"unterminated".into()));

        assert!(parse(&StringParser, "", ParamType::Text).is_err());
    }

    #[test]
    fn test_enum_parser() {
        let ty = ParamType::Enum {
            name: "Allowability",
            variants: &["ALLOW", "DENY"],
        };
        let r = parse(&EnumParser, "deny permissions", ty).unwrap();
        assert_eq!(r.value, Value::Enum("DENY"));
        assert_eq!(r.remaining, " permissions");

        assert_eq!(
            parse(&EnumParser, "maybe", ty).unwrap_err().to_string(),
            "Line parser encountered unexpected input which could not be parsed as an enum Allowability."
        );
    }

    struct Everyone;

    impl Directory for Everyone {
        fn guild_owner(&self, _guild: GuildId) -> Option<UserId> {
            None
        }
        fn member_roles(&self, _guild: GuildId, _user: UserId) -> Vec<RoleId> {
            Vec::new()
        }
        fn is_administrator(&self, _guild: GuildId, _user: UserId) -> bool {
            false
        }
        fn everyone_role(&self, guild: GuildId) -> RoleId {
            RoleId::new(guild.get() + 1)
        }
    }

    #[test]
    fn test_role_mention_parser() {
        let r = parse(&RoleMentionParser, "<role:123> deny", ParamType::Role).unwrap();
        assert_eq!(r.value, Value::Role(RoleId::new(123)));
        assert_eq!(r.remaining, " deny");

        let r = parse(&RoleMentionParser, "<@&55>", ParamType::Role).unwrap();
        assert_eq!(r.value, Value::Role(RoleId::new(55)));

        let ctx = ParseContext::new(Some(GuildId::new(9)), &Everyone);
        let r = RoleMentionParser.parse("@everyone x", &ParamType::Role, &ctx).unwrap();
        assert_eq!(r.value, Value::Role(RoleId::new(10)));
        assert_eq!(r.remaining, " x");

        // Without a guild there is no everyone role to resolve.
        assert!(parse(&RoleMentionParser, "@everyone", ParamType::Role).is_err());
        assert!(parse(&RoleMentionParser, "<@123>", ParamType::Role).is_err());
        assert!(parse(&RoleMentionParser, "<role:12", ParamType::Role).is_err());
    }

    #[test]
    fn test_user_and_channel_mentions() {
        for text in ["<@7>", "<@!7>", "<user:7>"] {
            let r = parse(&UserMentionParser, text, ParamType::User).unwrap();
            assert_eq!(r.value, Value::User(UserId::new(7)));
            assert_eq!(r.remaining, "");
        }
        assert!(parse(&UserMentionParser, "<@&7>", ParamType::User).is_err());

        let r = parse(&ChannelMentionParser, "<#99> hi", ParamType::Channel).unwrap();
        assert_eq!(r.value, Value::Channel(ChannelId::new(99)));
        assert_eq!(r.remaining, " hi");
        assert!(parse(&ChannelMentionParser, "#99", ParamType::Channel).is_err());
    }

    #[test]
    fn test_custom_emoji_parser() {
        let r = parse(&CustomEmojiParser, "<a:party_parrot:42> yay", ParamType::Emoji).unwrap();
        assert_eq!(
            r.value,
            Value::Emoji(CustomEmoji {
                id: EmojiId::new(42),
                name: "party_parrot".into(),
                animated: true,
            })
        );
        assert_eq!(r.remaining, " yay");

        assert!(parse(&CustomEmojiParser, "<:x:42>", ParamType::Emoji).is_err());
        assert!(parse(&CustomEmojiParser, "hi <:ok:42>", ParamType::Emoji).is_err());
    }
}
