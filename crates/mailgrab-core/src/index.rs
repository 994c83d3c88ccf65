//! Attachment index construction from structure descriptions.

use mailgrab_imap::{MessageId, PartNode, parse_structure};
use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::locator::AttachmentLocator;
use crate::traversal::{attachment_leaves, decode_filename};

/// A message left out of the index because its structure did not parse.
#[derive(Debug)]
pub struct SkippedMessage {
    /// Message that was skipped.
    pub message_id: MessageId,
    /// Why its structure was rejected.
    pub error: mailgrab_imap::Error,
}

/// Attachments found in a batch of messages.
#[derive(Debug, Default)]
pub struct AttachmentIndex {
    /// Locators grouped by message, in input order.
    pub locators: Vec<AttachmentLocator>,
    /// Messages whose structure could not be parsed.
    pub skipped: Vec<SkippedMessage>,
}

impl AttachmentIndex {
    /// Returns the number of attachments found.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Returns true if no attachments were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Returns the locators of one message.
    pub fn for_message<'a>(
        &'a self,
        message_id: &'a MessageId,
    ) -> impl Iterator<Item = &'a AttachmentLocator> + 'a {
        self.locators
            .iter()
            .filter(move |locator| &locator.message_id == message_id)
    }
}

/// Turns structure descriptions into attachment locators.
#[derive(Debug, Clone, Default)]
pub struct AttachmentIndexBuilder {
    config: IndexConfig,
}

impl AttachmentIndexBuilder {
    /// Creates a builder.
    #[must_use]
    pub const fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Indexes raw structure descriptions.
    ///
    /// A structure that fails to parse is logged and reported in
    /// [`AttachmentIndex::skipped`]; the rest of the batch is still indexed.
    pub fn build<I, S>(&self, structures: I) -> AttachmentIndex
    where
        I: IntoIterator<Item = (MessageId, S)>,
        S: AsRef<str>,
    {
        let mut index = AttachmentIndex::default();

        for (message_id, raw) in structures {
            match parse_structure(raw.as_ref()) {
                Ok(root) => index
                    .locators
                    .extend(self.index_message(&message_id, &root)),
                Err(error) => {
                    warn!(message_id = %message_id, %error, "Skipping message with unparsable structure");
                    index.skipped.push(SkippedMessage { message_id, error });
                }
            }
        }

        debug!(
            attachments = index.locators.len(),
            skipped = index.skipped.len(),
            "Built attachment index"
        );
        index
    }

    /// Indexes already parsed structures.
    pub fn build_parsed<I>(&self, structures: I) -> AttachmentIndex
    where
        I: IntoIterator<Item = (MessageId, PartNode)>,
    {
        let locators = structures
            .into_iter()
            .flat_map(|(message_id, root)| self.index_message(&message_id, &root))
            .collect();

        AttachmentIndex {
            locators,
            skipped: Vec::new(),
        }
    }

    /// Lists the attachments of one message in ordinal order.
    #[must_use]
    pub fn index_message(&self, message_id: &MessageId, root: &PartNode) -> Vec<AttachmentLocator> {
        attachment_leaves(root, self.config.policy)
            .into_iter()
            .enumerate()
            .map(|(ordinal, part)| {
                let (filename, charset) = part.filename().map_or_else(
                    || (self.config.fallback_name(ordinal), None),
                    |value| decode_filename(&value),
                );
                AttachmentLocator {
                    message_id: message_id.clone(),
                    ordinal,
                    filename,
                    charset,
                }
            })
            .collect()
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
    use crate::config::AttachmentPolicy;
    use proptest::prelude::*;

    fn id(value: &str) -> MessageId {
        MessageId::new(value).unwrap()
    }

    fn attachment(filename: &str) -> String {
        format!(
            r#"("application" "octet-stream" NIL NIL NIL "base64" 8 NIL ("attachment" ("filename" "{filename}")) NIL)"#
        )
    }

    fn mixed(parts: &[String]) -> String {
        format!("({} \"mixed\")", parts.concat())
    }

    const PLAIN: &str = r#"("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 5 1)"#;

    #[test]
    fn test_ordinals_per_message() {
        let builder = AttachmentIndexBuilder::default();
        let index = builder.build([
            (id("1"), mixed(&[PLAIN.to_string(), attachment("a.txt"), attachment("b.txt")])),
            (id("2"), mixed(&[attachment("c.txt")])),
        ]);

        let summary: Vec<_> = index
            .locators
            .iter()
            .map(|l| (l.message_id.as_str(), l.ordinal, l.filename.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("1", 0, "a.txt"), ("1", 1, "b.txt"), ("2", 0, "c.txt")]
        );
        assert_eq!(index.for_message(&id("1")).count(), 2);
    }

    #[test]
    fn test_no_attachments() {
        let index = AttachmentIndexBuilder::default().build([(id("5"), PLAIN)]);
        assert!(index.is_empty());
        assert!(index.skipped.is_empty());
    }

    #[test]
    fn test_malformed_message_is_skipped() {
        let index = AttachmentIndexBuilder::default().build([
            (id("1"), attachment("a.txt")),
            (id("2"), "((\"text\" \"plain\"".to_string()),
            (id("3"), attachment("c.txt")),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.skipped.len(), 1);
        assert_eq!(index.skipped[0].message_id, id("2"));
    }

    #[test]
    fn test_fallback_name() {
        let raw = mixed(&[
            r#"("application" "zip" NIL NIL NIL "base64" 8 NIL ("attachment" NIL) NIL)"#
                .to_string(),
        ]);
        let config = IndexConfig::builder().fallback_prefix("file").build();
        let index = AttachmentIndexBuilder::new(config).build([(id("9"), raw)]);

        assert_eq!(index.locators[0].filename, "file-0");
        assert_eq!(index.locators[0].charset, None);
    }

    #[test]
    fn test_encoded_filenames() {
        let index = AttachmentIndexBuilder::default().build([(
            id("4"),
            mixed(&[
                attachment("=?ISO-8859-1?Q?caf=E9.txt?="),
                attachment("plain.txt"),
            ]),
        )]);

        assert_eq!(index.locators[0].filename, "café.txt");
        assert_eq!(index.locators[0].charset.as_deref(), Some("ISO-8859-1"));
        assert_eq!(index.locators[1].filename, "plain.txt");
        assert_eq!(index.locators[1].charset, None);
    }

    #[test]
    fn test_undecodable_filename_uses_raw_value() {
        let index = AttachmentIndexBuilder::default()
            .build([(id("4"), attachment("=?x-no-such-charset?Q?a?="))]);
        assert_eq!(index.locators[0].filename, "=?x-no-such-charset?Q?a?=");
    }

    #[test]
    fn test_policy_includes_named_inline_parts() {
        let raw = mixed(&[
            r#"("image" "png" ("name" "logo.png") NIL NIL "base64" 8 NIL ("inline" NIL) NIL)"#
                .to_string(),
            attachment("a.txt"),
        ]);
        let config = IndexConfig::builder()
            .policy(AttachmentPolicy::DispositionOrFilename)
            .build();

        let strict = AttachmentIndexBuilder::default().build([(id("1"), raw.clone())]);
        let loose = AttachmentIndexBuilder::new(config).build([(id("1"), raw)]);

        assert_eq!(strict.len(), 1);
        assert_eq!(strict.locators[0].filename, "a.txt");
        assert_eq!(loose.len(), 2);
        assert_eq!(loose.locators[0].filename, "logo.png");
        assert_eq!(loose.locators[1].ordinal, 1);
    }

    #[test]
    fn test_build_parsed_matches_build() {
        let raw = mixed(&[attachment("a.txt"), attachment("a.txt")]);
        let builder = AttachmentIndexBuilder::default();

        let parsed = builder.build_parsed([(id("1"), parse_structure(&raw).unwrap())]);
        let from_raw = builder.build([(id("1"), raw)]);
        assert_eq!(parsed.locators, from_raw.locators);
    }

    proptest! {
        #[test]
        fn reindexing_gives_identical_ordinals(count in 0usize..12, with_body in any::<bool>()) {
            let mut parts: Vec<String> = (0..count).map(|i| attachment(&format!("f{i}.bin"))).collect();
            if with_body {
                parts.insert(0, PLAIN.to_string());
            }
            let raw = if parts.is_empty() { PLAIN.to_string() } else { mixed(&parts) };

            let builder = AttachmentIndexBuilder::default();
            let first = builder.build([(id("1"), raw.clone())]);
            let second = builder.build([(id("1"), raw)]);

            prop_assert_eq!(&first.locators, &second.locators);
            prop_assert_eq!(first.len(), count);
            for (ordinal, locator) in first.locators.iter().enumerate() {
                prop_assert_eq!(locator.ordinal, ordinal);
            }
        }
    }
}
