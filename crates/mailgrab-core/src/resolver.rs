//! Resolution of locators against fully downloaded messages.

use mailgrab_imap::MessageId;
use mailgrab_mime::Message;
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::locator::{AttachmentBytes, AttachmentLocator};
use crate::traversal::{MimeNode, attachment_leaves, decode_filename};
use crate::{Error, Result};

/// Finds the part a locator names inside a downloaded message.
///
/// Must be built from the same [`IndexConfig`] as the
/// [`crate::AttachmentIndexBuilder`] that produced the locator.
#[derive(Debug, Clone, Default)]
pub struct PartResolver {
    config: IndexConfig,
}

impl PartResolver {
    /// Creates a resolver.
    #[must_use]
    pub const fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Extracts the attachment `locator` names from a raw message.
    ///
    /// # Errors
    ///
    /// - [`Error::LocatorMismatch`] if the locator is for another message
    ///   (checked before parsing)
    /// - [`Error::Mime`] if the message cannot be parsed or the part body
    ///   cannot be decoded
    /// - [`Error::AttachmentNotFound`] if the message has fewer attachments
    pub fn resolve(
        &self,
        message_id: &MessageId,
        raw: &[u8],
        locator: &AttachmentLocator,
    ) -> Result<AttachmentBytes> {
        check_locator(message_id, locator)?;
        let message = Message::parse(raw)?;
        self.select(message_id, &message, locator)
    }

    /// Extracts the attachment `locator` names from a parsed message.
    ///
    /// # Errors
    ///
    /// Same as [`PartResolver::resolve`], minus parse failures.
    pub fn resolve_message(
        &self,
        message_id: &MessageId,
        message: &Message,
        locator: &AttachmentLocator,
    ) -> Result<AttachmentBytes> {
        check_locator(message_id, locator)?;
        self.select(message_id, message, locator)
    }

    fn select(
        &self,
        message_id: &MessageId,
        message: &Message,
        locator: &AttachmentLocator,
    ) -> Result<AttachmentBytes> {
        let leaves = attachment_leaves(message.root(), self.config.policy);
        let part = leaves
            .get(locator.ordinal)
            .ok_or_else(|| Error::AttachmentNotFound {
                message_id: message_id.clone(),
                ordinal: locator.ordinal,
                available: leaves.len(),
            })?;

        let filename = MimeNode::filename(*part).map_or_else(
            || self.config.fallback_name(locator.ordinal),
            |value| decode_filename(&value).0,
        );
        if filename != locator.filename {
            warn!(
                message_id = %message_id,
                ordinal = locator.ordinal,
                expected = %locator.filename,
                found = %filename,
                "Attachment filename differs from locator, using ordinal"
            );
        }

        let content = part.decode_body()?;
        debug!(
            message_id = %message_id,
            ordinal = locator.ordinal,
            bytes = content.len(),
            "Resolved attachment"
        );

        Ok(AttachmentBytes { filename, content })
    }
}

fn check_locator(message_id: &MessageId, locator: &AttachmentLocator) -> Result<()> {
    if &locator.message_id == message_id {
        Ok(())
    } else {
        Err(Error::LocatorMismatch {
            expected: locator.message_id.clone(),
            actual: message_id.clone(),
        })
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

    const RAW: &[u8] = b"From: a@example.com\r\n\
Subject: files\r\n\
Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n\
\r\n\
--XYZ\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
See attached.\r\n\
--XYZ\r\n\
Content-Type: text/plain; name=\"a.txt\"\r\n\
Content-Disposition: attachment; filename=\"a.txt\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
Zmlyc3Q=\r\n\
--XYZ\r\n\
Content-Type: text/plain; name=\"a.txt\"\r\n\
Content-Disposition: attachment; filename=\"a.txt\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
c2Vjb25k\r\n\
--XYZ\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment; filename=\"=?ISO-8859-1?Q?caf=E9.txt?=\"\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
caf=C3=A9 =\r\n\
au lait\r\n\
--XYZ--\r\n";

    fn id(value: &str) -> MessageId {
        MessageId::new(value).unwrap()
    }

    fn locator(ordinal: usize, filename: &str) -> AttachmentLocator {
        AttachmentLocator {
            message_id: id("7"),
            ordinal,
            filename: filename.to_string(),
            charset: None,
        }
    }

    #[test]
    fn test_duplicate_filenames_resolve_by_ordinal() {
        let resolver = PartResolver::default();

        let first = resolver.resolve(&id("7"), RAW, &locator(0, "a.txt")).unwrap();
        let second = resolver.resolve(&id("7"), RAW, &locator(1, "a.txt")).unwrap();

        assert_eq!(first.content, b"first");
        assert_eq!(second.content, b"second");
        assert_eq!(second.filename, "a.txt");
    }

    #[test]
    fn test_quoted_printable_and_encoded_name() {
        let bytes = PartResolver::default()
            .resolve(&id("7"), RAW, &locator(2, "café.txt"))
            .unwrap();

        assert_eq!(bytes.filename, "café.txt");
        assert_eq!(bytes.content, "café au lait".as_bytes());
    }

    #[test]
    fn test_ordinal_wins_over_filename() {
        let bytes = PartResolver::default()
            .resolve(&id("7"), RAW, &locator(1, "renamed.txt"))
            .unwrap();
        assert_eq!(bytes.content, b"second");
        assert_eq!(bytes.filename, "a.txt");
    }

    #[test]
    fn test_out_of_range() {
        let err = PartResolver::default()
            .resolve(&id("7"), RAW, &locator(3, "x"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::AttachmentNotFound {
                ordinal: 3,
                available: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_mismatch_checked_before_parsing() {
        let err = PartResolver::default()
            .resolve(&id("8"), b"garbage", &locator(0, "a.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::LocatorMismatch { .. }));
    }

    #[test]
    fn test_resolve_parsed_message() {
        let message = Message::parse(RAW).unwrap();
        let bytes = PartResolver::default()
            .resolve_message(&id("7"), &message, &locator(0, "a.txt"))
            .unwrap();
        assert_eq!(bytes.content, b"first");
    }

    #[test]
    fn test_no_attachments() {
        let raw = b"Content-Type: text/plain\r\n\r\nhello\r\n";
        let err = PartResolver::default()
            .resolve(&id("7"), raw, &locator(0, "a.txt"))
            .unwrap_err();
        assert!(matches!(err, Error::AttachmentNotFound { available: 0, .. }));
    }
}
