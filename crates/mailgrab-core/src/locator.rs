//! Attachment locators and extracted content.

use mailgrab_imap::MessageId;
use serde::{Deserialize, Serialize};

/// Names one attachment without carrying its content.
///
/// `ordinal` is the 0-based position among the attachment leaves of the
/// message in depth-first order; it, not the filename, selects the part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentLocator {
    /// Message holding the attachment.
    pub message_id: MessageId,
    /// Position among the message's attachments.
    pub ordinal: usize,
    /// Decoded filename, for display.
    pub filename: String,
    /// Charset the filename was declared in, if it was encoded.
    pub charset: Option<String>,
}

impl std::fmt::Display for AttachmentLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{} ({})", self.message_id, self.ordinal, self.filename)
    }
}

/// Decoded content of one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBytes {
    /// Decoded filename.
    pub filename: String,
    /// Content with the transfer encoding removed.
    pub content: Vec<u8>,
}
