//! MIME message structure and handling.

use crate::content_type::ContentType;
use crate::disposition::ContentDisposition;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use crate::params::{ParamValue, lookup};
use std::fmt;

/// Maximum multipart nesting accepted by the parser.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Reverses this encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid for the encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(data),
            Self::QuotedPrintable => decode_quoted_printable(data),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(data.to_vec()),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// MIME message part.
///
/// Multipart parts hold their children and an empty body; every other part,
/// including an encapsulated `message/rfc822`, is a leaf holding its raw
/// (still transfer-encoded) body.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes, transfer-encoded).
    pub body: Vec<u8>,
    /// Child parts, in order, for multipart parts.
    pub children: Vec<Self>,
}

impl Part {
    /// Creates a new leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            children: Vec::new(),
        }
    }

    /// Parses a part from its raw header block and body.
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart part has no boundary or nesting is
    /// deeper than [`MAX_NESTING_DEPTH`].
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_at_depth(raw, 0)
    }

    fn parse_at_depth(raw: &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::InvalidMultipart(format!(
                "nesting deeper than {MAX_NESTING_DEPTH} levels"
            )));
        }

        let (head, body) = split_header_body(raw);
        let headers = Headers::parse_bytes(head);

        // RFC 2045 §5.2: an unparsable Content-Type means text/plain
        let content_type = headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(ContentType::text_plain);

        if !content_type.is_multipart() {
            return Ok(Self::new(headers, body.to_vec()));
        }

        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        let children = split_multipart(body, boundary)
            .into_iter()
            .map(|child| Self::parse_at_depth(child, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            headers,
            body: Vec::new(),
            children,
        })
    }

    /// Gets the content type, defaulting to text/plain when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the parsed Content-Disposition header, if present.
    #[must_use]
    pub fn content_disposition(&self) -> Option<ContentDisposition> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
    }

    /// Returns true if this part was parsed as a multipart container.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.children.is_empty()
            || self.content_type().is_ok_and(|ct| ct.is_multipart())
    }

    /// Returns the filename: disposition `filename`, else content-type `name`.
    #[must_use]
    pub fn filename(&self) -> Option<ParamValue> {
        self.content_disposition()
            .and_then(|cd| cd.filename())
            .or_else(|| {
                self.content_type()
                    .ok()
                    .and_then(|ct| lookup(&ct.parameters, "name"))
            })
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        self.transfer_encoding().decode(&self.body)
    }
}

/// MIME message: the top-level part with the message headers.
#[derive(Debug, Clone)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a complete RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns an error if the MIME structure is invalid.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Ok(Self {
            root: Part::parse(raw)?,
        })
    }

    /// Returns the top-level part.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Returns the message headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }
}

/// Splits a part at the first empty line into header block and body.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = raw.strip_prefix(b"\r\n") {
        return (&[], body);
    }
    if let Some(body) = raw.strip_prefix(b"\n") {
        return (&[], body);
    }

    let crlf = find(raw, b"\r\n\r\n").map(|i| (i + 2, i + 4));
    let lf = find(raw, b"\n\n").map(|i| (i + 1, i + 2));

    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((head_end, body_start)) => (&raw[..head_end], &raw[body_start..]),
        None => (raw, &[]),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits a multipart body on `--boundary` delimiter lines.
///
/// The preamble and epilogue are dropped. The line break before each
/// delimiter belongs to the delimiter. A missing closing delimiter ends the
/// last part at the end of the body.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    let mut parts = Vec::new();
    let mut current_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i);
        let next = (line_end + 1).min(body.len());
        let line = body[pos..line_end].trim_ascii_end();

        if let Some(tail) = line.strip_prefix(delimiter) {
            let closing = tail.starts_with(b"--");
            if tail.is_empty() || closing {
                if let Some(start) = current_start.take() {
                    parts.push(strip_line_break(&body[start..pos.max(start)]));
                }
                if closing {
                    return parts;
                }
                current_start = Some(next);
            }
        }

        pos = next;
    }

    if let Some(start) = current_start {
        parts.push(&body[start..]);
    }
    parts
}

fn strip_line_break(part: &[u8]) -> &[u8] {
    let part = part.strip_suffix(b"\n").unwrap_or(part);
    part.strip_suffix(b"\r").unwrap_or(part)
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
    use crate::disposition::Disposition;

    const MIXED: &str = concat!(
        "From: sender@example.com\r\n",
        "Subject: Quarterly\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "This is the preamble.\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "Plain body\r\n",
        "--inner\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>HTML body</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf; name=\"q.pdf\"\r\n",
        "Content-Disposition: attachment; filename=\"q.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "JVBERi0xLjQg\r\n",
        "ZmFrZQ==\r\n",
        "--outer--\r\n",
        "Epilogue.\r\n"
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_parse_nested_multipart() {
        let message = Message::parse(MIXED.as_bytes()).unwrap();
        assert_eq!(message.headers().get("subject"), Some("Quarterly"));

        let root = message.root();
        assert!(root.is_multipart());
        assert_eq!(root.children.len(), 2);

        let alternative = &root.children[0];
        assert_eq!(alternative.children.len(), 2);
        assert_eq!(alternative.children[0].decode_body().unwrap(), b"Plain body");
        assert_eq!(
            alternative.children[1].decode_body().unwrap(),
            b"<p>HTML body</p>"
        );

        let pdf = &root.children[1];
        assert!(!pdf.is_multipart());
        assert_eq!(
            pdf.content_disposition().unwrap().disposition,
            Disposition::Attachment
        );
        assert_eq!(pdf.decode_body().unwrap(), b"%PDF-1.4 fake");
    }

    #[test]
    fn test_filename_falls_back_to_name() {
        let part = Part::parse(b"Content-Type: image/png; name=\"logo.png\"\r\n\r\nxx").unwrap();
        assert_eq!(
            part.filename(),
            Some(ParamValue::Plain("logo.png".to_string()))
        );
    }

    #[test]
    fn test_single_part_lf_only() {
        let message = Message::parse(b"Subject: hi\nContent-Type: text/plain\n\nline one\nline two\n")
            .unwrap();
        assert!(message.root().children.is_empty());
        assert_eq!(message.root().body, b"line one\nline two\n");
    }

    #[test]
    fn test_missing_boundary() {
        let result = Message::parse(b"Content-Type: multipart/mixed\r\n\r\nbody");
        assert!(matches!(result, Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "\r\n",
            "first\r\n",
            "--b\r\n",
            "\r\n",
            "second"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        let bodies: Vec<_> = message
            .root()
            .children
            .iter()
            .map(|p| p.body.clone())
            .collect();
        assert_eq!(bodies, vec![b"first".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn test_boundary_prefix_is_not_delimiter() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "\r\n",
            "--bogus line stays\r\n",
            "--b--\r\n"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        assert_eq!(message.root().children.len(), 1);
        assert_eq!(message.root().children[0].body, b"--bogus line stays");
    }

    #[test]
    fn test_encapsulated_message_is_leaf() {
        let raw = concat!(
            "Content-Type: multipart/mixed; boundary=b\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: message/rfc822\r\n",
            "\r\n",
            "Content-Type: multipart/mixed; boundary=c\r\n",
            "\r\n",
            "--c\r\n",
            "\r\n",
            "nested\r\n",
            "--c--\r\n",
            "--b--\r\n"
        );
        let message = Message::parse(raw.as_bytes()).unwrap();
        let forwarded = &message.root().children[0];
        assert!(forwarded.children.is_empty());
        assert!(!forwarded.is_multipart());
    }

    #[test]
    fn test_quoted_printable_body() {
        let part = Part::parse(
            b"Content-Transfer-Encoding: quoted-printable\r\n\r\ncaf=C3=A9 =\r\nau lait",
        )
        .unwrap();
        assert_eq!(part.decode_body().unwrap(), "café au lait".as_bytes());
    }
}
