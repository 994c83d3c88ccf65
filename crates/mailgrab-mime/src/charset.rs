//! Charset decoding for header words and extended parameters.
//!
//! Labels are resolved through the WHATWG encoding registry, so the usual
//! MIME names (`ISO-8859-1`, `utf-8`, `windows-1252`, `koi8-r`, ...) and
//! their aliases are accepted.

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// Decodes `bytes` declared as `charset` into a Rust string.
///
/// An RFC 2231 language suffix (`utf-8*en`) is ignored. Malformed byte
/// sequences are replaced with U+FFFD rather than rejected.
///
/// # Errors
///
/// Returns [`Error::UnknownCharset`] if the label is not recognized.
pub fn decode_charset(charset: &str, bytes: &[u8]) -> Result<String> {
    let label = charset.split('*').next().unwrap_or_default().trim();
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::UnknownCharset(charset.to_string()))?;
    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

/// Decodes raw header bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every byte).
#[must_use]
pub fn decode_header_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1() {
        assert_eq!(decode_charset("ISO-8859-1", b"caf\xe9").unwrap(), "café");
    }

    #[test]
    fn test_utf8_with_language_suffix() {
        assert_eq!(
            decode_charset("utf-8*en", "naïve".as_bytes()).unwrap(),
            "naïve"
        );
    }

    #[test]
    fn test_unknown_charset() {
        let err = decode_charset("x-no-such-charset", b"abc").unwrap_err();
        assert!(matches!(err, Error::UnknownCharset(_)));
    }

    #[test]
    fn test_header_bytes_fallback() {
        assert_eq!(decode_header_bytes(b"Subject: caf\xe9"), "Subject: café");
        assert_eq!(decode_header_bytes("Subject: ok".as_bytes()), "Subject: ok");
    }
}
