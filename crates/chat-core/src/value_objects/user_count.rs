//! Connected-client count reported by the server
//!
//! The server sends `user_count` as a decimal string (`"5"`), older builds as a
//! bare number. Both forms decode to the same value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::DomainError;

/// Total number of identities connected to the chat, named or not
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UserCount(u32);

impl UserCount {
    /// Create a count from a raw value
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw value
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Parse a count from its string form, tolerating surrounding whitespace
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| DomainError::InvalidUserCount(s.to_string()))
    }
}

impl fmt::Display for UserCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserCount {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<UserCount> for u32 {
    fn from(count: UserCount) -> Self {
        count.0
    }
}

impl std::str::FromStr for UserCount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserCount::parse(s)
    }
}

// Serialize as string, matching what the server emits
impl Serialize for UserCount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for UserCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct UserCountVisitor;

        impl<'de> Visitor<'de> for UserCountVisitor {
            type Value = UserCount;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or non-negative integer user count")
            }

            fn visit_i64<E>(self, value: i64) -> Result<UserCount, E>
            where
                E: de::Error,
            {
                u32::try_from(value)
                    .map(UserCount)
                    .map_err(|_| de::Error::custom("user count out of range"))
            }

            fn visit_u64<E>(self, value: u64) -> Result<UserCount, E>
            where
                E: de::Error,
            {
                u32::try_from(value)
                    .map(UserCount)
                    .map_err(|_| de::Error::custom("user count out of range"))
            }

            fn visit_str<E>(self, value: &str) -> Result<UserCount, E>
            where
                E: de::Error,
            {
                UserCount::parse(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(UserCountVisitor)
    }
}
