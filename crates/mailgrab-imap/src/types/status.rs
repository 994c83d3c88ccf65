//! Completion status and raw transport results.

use crate::{Error, Result};

/// Status response type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }

    /// Parses a status keyword, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "PREAUTH" => Some(Self::PreAuth),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        };
        f.write_str(s)
    }
}

/// Result of one transport command: completion status plus untagged data.
///
/// For `SEARCH` the payload is the space-separated identifier list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResult {
    /// Completion status.
    pub status: Status,
    /// Untagged response data.
    pub payload: String,
}

impl WireResult {
    /// Creates a wire result.
    #[must_use]
    pub fn new(status: Status, payload: impl Into<String>) -> Self {
        Self {
            status,
            payload: payload.into(),
        }
    }

    /// Creates a successful wire result.
    #[must_use]
    pub fn ok(payload: impl Into<String>) -> Self {
        Self::new(Status::Ok, payload)
    }

    /// Returns the payload if the status is successful.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedResponse`] for `NO`, `BAD` and `BYE`.
    pub fn into_payload(self) -> Result<String> {
        if self.status.is_ok() {
            Ok(self.payload)
        } else {
            Err(Error::MalformedResponse(format!(
                "server answered {}: {}",
                self.status,
                self.payload.trim()
            )))
        }
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

    mod status {
        use super::*;

        #[test]
        fn is_ok_for_ok() {
            assert!(Status::Ok.is_ok());
        }

        #[test]
        fn is_ok_for_preauth() {
            assert!(Status::PreAuth.is_ok());
        }

        #[test]
        fn is_ok_false_for_failures() {
            assert!(!Status::No.is_ok());
            assert!(!Status::Bad.is_ok());
            assert!(!Status::Bye.is_ok());
        }

        #[test]
        fn parse_case_insensitive() {
            assert_eq!(Status::parse("ok"), Some(Status::Ok));
            assert_eq!(Status::parse("PreAuth"), Some(Status::PreAuth));
            assert_eq!(Status::parse("MAYBE"), None);
        }
    }

    mod wire_result {
        use super::*;

        #[test]
        fn into_payload_ok() {
            assert_eq!(WireResult::ok("1 2 3").into_payload().unwrap(), "1 2 3");
        }

        #[test]
        fn into_payload_no() {
            let err = WireResult::new(Status::No, "mailbox gone")
                .into_payload()
                .unwrap_err();
            assert!(matches!(err, Error::MalformedResponse(msg) if msg.contains("NO")));
        }
    }
}
