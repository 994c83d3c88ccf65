//! Attachment enumeration shared by indexing and resolution.
//!
//! Ordinals handed out while indexing `BODYSTRUCTURE` trees must select the
//! same parts once the full message is downloaded. Both trees implement
//! [`MimeNode`] and go through [`attachment_leaves`], so there is a single
//! definition of "the n-th attachment".

use mailgrab_imap::PartNode;
use mailgrab_mime::{Disposition, ParamValue, Part};
use tracing::warn;

use crate::config::AttachmentPolicy;

/// A node of a MIME part tree.
pub trait MimeNode: Sized {
    /// Returns true for multipart containers.
    fn is_container(&self) -> bool;

    /// Child parts, in order.
    fn children(&self) -> &[Self];

    /// Content disposition of the part.
    fn disposition(&self) -> Disposition;

    /// Filename: disposition `filename`, else content-type `name`.
    fn filename(&self) -> Option<ParamValue>;
}

impl MimeNode for PartNode {
    fn is_container(&self) -> bool {
        self.is_multipart()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn disposition(&self) -> Disposition {
        self.disposition
    }

    fn filename(&self) -> Option<ParamValue> {
        Self::filename(self)
    }
}

impl MimeNode for Part {
    fn is_container(&self) -> bool {
        self.is_multipart()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn disposition(&self) -> Disposition {
        self.content_disposition()
            .map(|cd| cd.disposition)
            .unwrap_or_default()
    }

    fn filename(&self) -> Option<ParamValue> {
        Self::filename(self)
    }
}

/// Returns the leaves that `policy` qualifies as attachments, depth-first
/// and left to right. The index in the result is the attachment ordinal.
pub fn attachment_leaves<N: MimeNode>(root: &N, policy: AttachmentPolicy) -> Vec<&N> {
    let mut leaves = Vec::new();
    collect(root, policy, &mut leaves);
    leaves
}

fn collect<'a, N: MimeNode>(node: &'a N, policy: AttachmentPolicy, leaves: &mut Vec<&'a N>) {
    if node.is_container() {
        for child in node.children() {
            collect(child, policy, leaves);
        }
    } else if policy.qualifies(node.disposition(), node.filename().is_some()) {
        leaves.push(node);
    }
}

/// Decodes a filename parameter, falling back to the raw value.
///
/// Returns the name and the charset it was declared in.
pub(crate) fn decode_filename(value: &ParamValue) -> (String, Option<String>) {
    match value.decode() {
        Ok(decoded) => decoded,
        Err(error) => {
            let raw = value.raw();
            warn!(filename = %raw, %error, "Failed to decode filename, using raw value");
            (raw, None)
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
    use mailgrab_imap::parse_structure;
    use mailgrab_mime::Message;

    const STRUCTURE: &str = concat!(
        r#"(("text" "plain" NIL NIL NIL "7bit" 5 1)"#,
        r#"("image" "png" ("name" "logo.png") NIL NIL "base64" 8 NIL ("inline" NIL) NIL)"#,
        r#"(("application" "pdf" NIL NIL NIL "base64" 8 NIL ("attachment" ("filename" "a.pdf")) NIL)"#,
        r#"("text" "plain" NIL NIL NIL "7bit" 5 1 NIL ("attachment" NIL) NIL) "mixed")"#,
        r#" "mixed")"#
    );

    const MESSAGE: &[u8] = b"Content-Type: multipart/mixed; boundary=outer\r\n\
\r\n\
--outer\r\n\
Content-Type: text/plain\r\n\
\r\n\
hello\r\n\
--outer\r\n\
Content-Type: image/png; name=logo.png\r\n\
Content-Disposition: inline\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAEC//4=\r\n\
--outer\r\n\
Content-Type: multipart/mixed; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: application/pdf\r\n\
Content-Disposition: attachment; filename=a.pdf\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAEC//4=\r\n\
--inner\r\n\
Content-Type: text/plain\r\n\
Content-Disposition: attachment\r\n\
\r\n\
notes\r\n\
--inner--\r\n\
--outer--\r\n";

    #[test]
    fn test_structure_and_message_agree() {
        let node = parse_structure(STRUCTURE).unwrap();
        let message = Message::parse(MESSAGE).unwrap();

        for policy in [
            AttachmentPolicy::Disposition,
            AttachmentPolicy::DispositionOrFilename,
        ] {
            let from_structure = attachment_leaves(&node, policy);
            let from_message = attachment_leaves(message.root(), policy);
            assert_eq!(from_structure.len(), from_message.len());

            for (a, b) in from_structure.iter().zip(&from_message) {
                assert_eq!(a.filename(), MimeNode::filename(*b));
                assert_eq!(MimeNode::disposition(*a), b.disposition());
            }
        }
    }

    #[test]
    fn test_policy_changes_ordinals() {
        let node = parse_structure(STRUCTURE).unwrap();
        assert_eq!(attachment_leaves(&node, AttachmentPolicy::Disposition).len(), 2);
        assert_eq!(
            attachment_leaves(&node, AttachmentPolicy::DispositionOrFilename).len(),
            3
        );
    }

    #[test]
    fn test_single_leaf_root() {
        let node = parse_structure(
            r#"("application" "zip" NIL NIL NIL "base64" 8 NIL ("attachment" NIL) NIL)"#,
        )
        .unwrap();
        assert_eq!(attachment_leaves(&node, AttachmentPolicy::Disposition).len(), 1);
    }

    #[test]
    fn test_decode_filename_fallback() {
        let bad = ParamValue::Plain("=?utf-8?X?broken?=".to_string());
        assert_eq!(decode_filename(&bad), ("=?utf-8?X?broken?=".to_string(), None));

        let good = ParamValue::Plain("=?ISO-8859-1?Q?caf=E9.txt?=".to_string());
        assert_eq!(
            decode_filename(&good),
            ("café.txt".to_string(), Some("ISO-8859-1".to_string()))
        );
    }
}
