//! Message identifiers.
//!
//! Types for server-assigned message identifiers and sequence numbers.

use std::num::NonZeroU32;
use std::str::FromStr;

use crate::{Error, Result};

/// Opaque server-assigned message identifier (usually a UID).
///
/// Identifiers travel inside comma-joined wire tokens, so they must be
/// non-empty and free of whitespace and `,`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a message identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessageId`] if the value is empty or contains
    /// whitespace or a comma.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(|c| c.is_whitespace() || c == ',') {
            return Err(Error::InvalidMessageId(id));
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for MessageId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl From<NonZeroU32> for MessageId {
    fn from(uid: NonZeroU32) -> Self {
        Self(uid.to_string())
    }
}

/// Message sequence number.
///
/// Sequence numbers are assigned to messages in a mailbox starting from 1.
/// They are ephemeral and change when messages are expunged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeqNum(pub NonZeroU32);

impl SeqNum {
    /// Creates a new sequence number.
    ///
    /// Returns `None` if the value is 0.
    #[must_use]
    pub fn new(n: u32) -> Option<Self> {
        NonZeroU32::new(n).map(Self)
    }

    /// Returns the underlying value.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for SeqNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_valid() {
        let id = MessageId::new("4821").unwrap();
        assert_eq!(id.as_str(), "4821");
        assert_eq!(id.to_string(), "4821");
        assert_eq!("abc-1".parse::<MessageId>().unwrap().as_str(), "abc-1");
    }

    #[test]
    fn test_message_id_rejects_delimiters() {
        for bad in ["", "1,2", "1 2", "1\t", "\r\n"] {
            assert!(
                matches!(MessageId::new(bad), Err(Error::InvalidMessageId(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_message_id_from_uid() {
        let uid = NonZeroU32::new(77).unwrap();
        assert_eq!(MessageId::from(uid).as_str(), "77");
    }

    #[test]
    fn test_seq_num_new() {
        assert!(SeqNum::new(0).is_none());
        assert_eq!(SeqNum::new(42).unwrap().get(), 42);
    }
}
