//! Platform identifiers.
//!
//! Every chat platform Herald has been pointed at so far hands out numeric
//! snowflake ids, so each id is a transparent `u64` newtype. The newtypes keep
//! a role id from being passed where a user id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw platform id.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Returns the raw platform id.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Identifies a community (a Discord guild, a group chat, ...).
    GuildId
);
define_id!(
    /// Identifies a user account.
    UserId
);
define_id!(
    /// Identifies a role within a guild.
    RoleId
);
define_id!(
    /// Identifies a text channel.
    ChannelId
);
define_id!(
    /// Identifies a guild-specific custom emoji.
    EmojiId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let role: RoleId = "123".parse().unwrap();
        assert_eq!(role, RoleId::new(123));
        assert_eq!(role.to_string(), "123");
        assert!("abc".parse::<RoleId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&GuildId::new(42)).unwrap();
        assert_eq!(json, "42");
        let back: GuildId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 42);
    }
}
