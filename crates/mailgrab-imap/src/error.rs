//! Error types for the IMAP library.

use thiserror::Error;

/// Errors that can occur while interpreting IMAP server data.
#[derive(Debug, Error)]
pub enum Error {
    /// Protocol parsing error.
    #[error("Protocol error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Well-formed tokens that do not describe a valid body structure.
    #[error("Invalid body structure: {0}")]
    InvalidStructure(String),

    /// Server answered with a non-success status.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Identifier that cannot travel in a wire token.
    #[error("Invalid message identifier: {0:?}")]
    InvalidMessageId(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
