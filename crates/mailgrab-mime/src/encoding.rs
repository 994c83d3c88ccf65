//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header decoding.

use crate::charset::decode_charset;
use crate::error::{Error, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Base64 engine that accepts input with or without trailing padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes Base64 data.
///
/// Whitespace (line breaks inside MIME bodies) is skipped and missing
/// padding is tolerated.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    LENIENT_BASE64.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045) to raw bytes.
///
/// An `=` that starts neither a soft line break nor a two-digit hex escape
/// is kept literally, as RFC 2045 section 6.7 recommends.
///
/// # Errors
///
/// Currently infallible; the `Result` matches [`decode_base64`].
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with trailing whitespace before it
        let mut j = i + 1;
        while j < data.len() && (data[j] == b' ' || data[j] == b'\t') {
            j += 1;
        }
        if data.get(j) == Some(&b'\r') && data.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }
        if data.get(j) == Some(&b'\n') {
            i = j + 1;
            continue;
        }
        if j == data.len() {
            break;
        }

        match data.get(i + 1..i + 3).and_then(decode_hex_pair) {
            Some(decoded) => {
                result.push(decoded);
                i += 3;
            }
            None => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    Ok(result)
}

fn decode_hex_pair(hex: &[u8]) -> Option<u8> {
    let high = char::from(hex[0]).to_digit(16)?;
    let low = char::from(hex[1]).to_digit(16)?;
    u8::try_from(high * 16 + low).ok()
}

/// One run of a decoded header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWord {
    /// Decoded text.
    pub text: String,
    /// Charset the text was declared in, `None` for literal runs.
    pub charset: Option<String>,
}

impl DecodedWord {
    fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            charset: None,
        }
    }
}

/// Adjacent encoded-words sharing a charset, not yet charset-decoded.
struct PendingWord {
    charset: String,
    bytes: Vec<u8>,
}

impl PendingWord {
    fn finish(self) -> Result<DecodedWord> {
        let text = decode_charset(&self.charset, &self.bytes)?;
        Ok(DecodedWord {
            text,
            charset: Some(self.charset),
        })
    }
}

/// Decodes an RFC 2047 header value into `(text, charset)` runs.
///
/// Format of an encoded-word: `=?charset?encoding?encoded-text?=`
///
/// Literal text passes through with no charset. Whitespace between two
/// encoded-words is dropped, and consecutive encoded-words in the same
/// charset are joined before charset decoding.
///
/// # Errors
///
/// Returns [`Error::HeaderDecode`] on malformed encoded-word syntax and
/// [`Error::UnknownCharset`] on an unsupported charset.
pub fn decode_rfc2047_words(text: &str) -> Result<Vec<DecodedWord>> {
    let mut words = Vec::new();
    let mut pending: Option<PendingWord> = None;
    let mut rest = text;

    while let Some(start) = rest.find("=?") {
        let before = &rest[..start];
        let (charset, bytes, consumed) = parse_encoded_word(&rest[start..])?;

        let joins_pending = pending.as_ref().is_some_and(|p| {
            before.chars().all(char::is_whitespace) && p.charset.eq_ignore_ascii_case(charset)
        });

        if joins_pending {
            if let Some(p) = pending.as_mut() {
                p.bytes.extend_from_slice(&bytes);
            }
        } else {
            let after_word = pending.is_some();
            if let Some(p) = pending.take() {
                words.push(p.finish()?);
            }
            // Whitespace separating two encoded-words is not part of the text
            let separator = after_word && before.chars().all(char::is_whitespace);
            if !separator && !before.is_empty() {
                words.push(DecodedWord::literal(before));
            }
            pending = Some(PendingWord {
                charset: charset.to_string(),
                bytes,
            });
        }

        rest = &rest[start + consumed..];
    }

    if let Some(p) = pending.take() {
        words.push(p.finish()?);
    }
    if !rest.is_empty() {
        words.push(DecodedWord::literal(rest));
    }

    Ok(words)
}

/// Parses one encoded-word at the start of `s`.
///
/// Returns the charset, the transfer-decoded bytes and the number of bytes consumed.
fn parse_encoded_word(s: &str) -> Result<(&str, Vec<u8>, usize)> {
    let inner = &s[2..];

    let (charset, rest) = inner
        .split_once('?')
        .ok_or_else(|| malformed("missing encoding field"))?;
    if charset.is_empty() || charset.contains(char::is_whitespace) {
        return Err(malformed("invalid charset"));
    }

    let (encoding, rest) = rest
        .split_once('?')
        .ok_or_else(|| malformed("missing encoded text"))?;

    let end = rest
        .find("?=")
        .ok_or_else(|| malformed("missing terminator"))?;
    let encoded = &rest[..end];
    if encoded.contains(char::is_whitespace) {
        return Err(malformed("whitespace inside encoded text"));
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64(encoded.as_bytes())
            .map_err(|e| malformed(&format!("bad base64: {e}")))?,
        "Q" | "q" => decode_q(encoded.as_bytes())?,
        other => return Err(malformed(&format!("unknown encoding {other:?}"))),
    };

    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;
    Ok((charset, bytes, consumed))
}

/// Decodes RFC 2047 "Q" encoding: quoted-printable with `_` as space.
fn decode_q(encoded: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(encoded.len());
    let mut i = 0;

    while i < encoded.len() {
        match encoded[i] {
            b'_' => {
                result.push(b' ');
                i += 1;
            }
            b'=' => {
                let hex = encoded
                    .get(i + 1..i + 3)
                    .ok_or_else(|| malformed("truncated Q escape"))?;
                let byte = decode_hex_pair(hex).ok_or_else(|| malformed("invalid Q escape"))?;
                result.push(byte);
                i += 3;
            }
            other => {
                result.push(other);
                i += 1;
            }
        }
    }

    Ok(result)
}

fn malformed(reason: &str) -> Error {
    Error::HeaderDecode(format!("malformed encoded-word: {reason}"))
}

/// Decodes an RFC 2047 header value into a single string.
///
/// # Errors
///
/// Returns an error if the value contains a malformed encoded-word.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    Ok(decode_rfc2047_words(text)?
        .into_iter()
        .map(|w| w.text)
        .collect())
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_decode() {
        let decoded = decode_base64(b"SGVsbG8sIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_lenient() {
        let decoded = decode_base64(b"SGVsbG8s\r\nIFdvcmxkIQ").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(
            decode_quoted_printable(b"Hello, World!").unwrap(),
            b"Hello, World!"
        );
        assert_eq!(
            decode_quoted_printable(b"H=C3=A9llo").unwrap(),
            "Héllo".as_bytes()
        );
        assert_eq!(decode_quoted_printable(b"caf=E9").unwrap(), b"caf\xe9");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(
            decode_quoted_printable(b"Hello=\r\nWorld").unwrap(),
            b"HelloWorld"
        );
        assert_eq!(
            decode_quoted_printable(b"Hello=  \nWorld").unwrap(),
            b"HelloWorld"
        );
    }

    #[test]
    fn test_quoted_printable_malformed_escape_kept_literally() {
        assert_eq!(decode_quoted_printable(b"bad=ZZ").unwrap(), b"bad=ZZ");
        assert_eq!(decode_quoted_printable(b"short=A").unwrap(), b"short=A");
        assert_eq!(decode_quoted_printable(b"a=\rb").unwrap(), b"a=\rb");
        assert_eq!(decode_quoted_printable(b"x=\r=41").unwrap(), b"x=\rA");
        assert_eq!(decode_quoted_printable(b"1+1=2").unwrap(), b"1+1=2");
    }

    #[test]
    fn test_rfc2047_plain_passthrough() {
        let words = decode_rfc2047_words("report.pdf").unwrap();
        assert_eq!(words, vec![DecodedWord::literal("report.pdf")]);
    }

    #[test]
    fn test_rfc2047_empty() {
        assert!(decode_rfc2047_words("").unwrap().is_empty());
    }

    #[test]
    fn test_rfc2047_single_word() {
        let words = decode_rfc2047_words("=?utf-8?B?SMOpbGxv?=").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "Héllo");
        assert_eq!(words[0].charset.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_rfc2047_latin1_q() {
        let words = decode_rfc2047_words("=?ISO-8859-1?Q?caf=E9_menu.txt?=").unwrap();
        assert_eq!(words[0].text, "café menu.txt");
        assert_eq!(words[0].charset.as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_rfc2047_latin1_b() {
        assert_eq!(
            decode_rfc2047("=?iso-8859-1?B?Y2Fm6S50eHQ=?=").unwrap(),
            "café.txt"
        );
    }

    #[test]
    fn test_rfc2047_adjacent_words_joined() {
        // "é" split across two words: C3 | A9
        let words = decode_rfc2047_words("=?utf-8?Q?caf=C3?= =?utf-8?Q?=A9?=").unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "café");
    }

    #[test]
    fn test_rfc2047_mixed_literal_and_words() {
        let words = decode_rfc2047_words("Re: =?utf-8?Q?caf=C3=A9?= notes").unwrap();
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Re: ", "café", " notes"]);
        assert_eq!(words[0].charset, None);
        assert_eq!(words[1].charset.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_rfc2047_different_charsets_stay_separate() {
        let words =
            decode_rfc2047_words("=?iso-8859-1?Q?caf=E9?= =?utf-8?Q?_cr=C3=A8me?=").unwrap();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "café");
        assert_eq!(words[1].text, " crème");
    }

    #[test]
    fn test_rfc2047_malformed() {
        assert!(matches!(
            decode_rfc2047_words("=?utf-8?B?SMOpbGxv"),
            Err(Error::HeaderDecode(_))
        ));
        assert!(matches!(
            decode_rfc2047_words("=?utf-8?X?abc?="),
            Err(Error::HeaderDecode(_))
        ));
        assert!(matches!(
            decode_rfc2047_words("=?utf-8?Q?bad=G1?="),
            Err(Error::HeaderDecode(_))
        ));
        assert!(matches!(
            decode_rfc2047_words("=?klingon?Q?abc?="),
            Err(Error::UnknownCharset(_))
        ));
    }

    proptest! {
        #[test]
        fn plain_text_passes_through(text in "[ -<>-~]{1,60}") {
            let words = decode_rfc2047_words(&text).unwrap();
            prop_assert_eq!(words.len(), 1);
            prop_assert_eq!(&words[0].text, &text);
            prop_assert!(words[0].charset.is_none());
        }
    }
}
