//! Error types for the core library.

use mailgrab_imap::MessageId;
use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// MIME message could not be parsed or decoded.
    #[error("MIME error: {0}")]
    Mime(#[from] mailgrab_mime::Error),

    /// Transport answered with data that does not match the request.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Locator belongs to a different message than the one supplied.
    #[error("Locator is for message {expected}, got message {actual}")]
    LocatorMismatch {
        /// Message the locator names.
        expected: MessageId,
        /// Message that was supplied.
        actual: MessageId,
    },

    /// Message has fewer attachments than the locator's ordinal implies.
    #[error("Attachment {ordinal} not found in message {message_id} ({available} available)")]
    AttachmentNotFound {
        /// Message searched.
        message_id: MessageId,
        /// Requested ordinal.
        ordinal: usize,
        /// Number of attachments actually present.
        available: usize,
    },

    /// Transport failure, passed through unchanged.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
