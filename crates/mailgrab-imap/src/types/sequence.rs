//! Ordered sets of message identifiers.

use super::{MessageId, WireResult};
use crate::Result;

/// Ordered set of message identifiers, in server response order.
///
/// The wire token form joins identifiers with `,`; the empty set maps to the
/// empty token, which callers treat as "nothing to fetch".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct MessageIdSet(Vec<MessageId>);

impl MessageIdSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a search result.
    ///
    /// The payload is split on whitespace. An empty payload yields an empty
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedResponse`] if the status is not a
    /// success.
    pub fn from_wire_result(result: WireResult) -> Result<Self> {
        let payload = result.into_payload()?;
        payload.split_whitespace().map(MessageId::new).collect()
    }

    /// Parses a comma-joined wire token, the inverse of
    /// [`MessageIdSet::to_wire_token`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidMessageId`] for empty elements.
    pub fn from_wire_token(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Ok(Self::new());
        }
        token.split(',').map(MessageId::new).collect()
    }

    /// Joins the identifiers with `,`.
    #[must_use]
    pub fn to_wire_token(&self) -> String {
        self.0
            .iter()
            .map(MessageId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Appends an identifier.
    pub fn push(&mut self, id: MessageId) {
        self.0.push(id);
    }

    /// Returns an iterator over the identifiers.
    pub fn iter(&self) -> std::slice::Iter<'_, MessageId> {
        self.0.iter()
    }

    /// Returns the number of identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MessageIdSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_wire_token())
    }
}

impl FromIterator<MessageId> for MessageIdSet {
    fn from_iter<I: IntoIterator<Item = MessageId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MessageIdSet {
    type Item = MessageId;
    type IntoIter = std::vec::IntoIter<MessageId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageIdSet {
    type Item = &'a MessageId;
    type IntoIter = std::slice::Iter<'a, MessageId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
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
    use crate::Error;
    use crate::types::Status;
    use proptest::prelude::*;

    fn ids(values: &[&str]) -> MessageIdSet {
        values.iter().map(|v| MessageId::new(*v).unwrap()).collect()
    }

    #[test]
    fn test_wire_token() {
        assert_eq!(MessageIdSet::new().to_wire_token(), "");
        assert_eq!(ids(&["1", "3", "7"]).to_wire_token(), "1,3,7");
        assert_eq!(ids(&["42"]).to_string(), "42");
    }

    #[test]
    fn test_from_wire_result() {
        let set = MessageIdSet::from_wire_result(WireResult::ok("1 3 7")).unwrap();
        assert_eq!(set, ids(&["1", "3", "7"]));
    }

    #[test]
    fn test_from_wire_result_empty_payload() {
        for payload in ["", "   ", "\r\n"] {
            let set = MessageIdSet::from_wire_result(WireResult::ok(payload)).unwrap();
            assert!(set.is_empty());
            assert_eq!(set.len(), 0);
        }
    }

    #[test]
    fn test_from_wire_result_failure_status() {
        let result = MessageIdSet::from_wire_result(WireResult::new(Status::Bad, "1 2"));
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn test_from_wire_token() {
        assert!(MessageIdSet::from_wire_token("").unwrap().is_empty());
        assert_eq!(
            MessageIdSet::from_wire_token("1,3,7").unwrap(),
            ids(&["1", "3", "7"])
        );
        assert!(matches!(
            MessageIdSet::from_wire_token("1,,2"),
            Err(Error::InvalidMessageId(_))
        ));
    }

    #[test]
    fn test_push_preserves_order() {
        let mut set = MessageIdSet::new();
        set.push(MessageId::new("9").unwrap());
        set.push(MessageId::new("2").unwrap());
        let order: Vec<_> = set.iter().map(MessageId::as_str).collect();
        assert_eq!(order, vec!["9", "2"]);
    }

    proptest! {
        #[test]
        fn wire_token_round_trip(values in proptest::collection::vec("[A-Za-z0-9._-]{1,12}", 0..20)) {
            let set: MessageIdSet = values.iter().map(|v| MessageId::new(v.as_str()).unwrap()).collect();
            let token = set.to_wire_token();
            prop_assert_eq!(MessageIdSet::from_wire_token(&token).unwrap(), set);
        }
    }
}
