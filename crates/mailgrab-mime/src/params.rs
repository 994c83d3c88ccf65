//! Header parameter lists (RFC 2045 §5.1) and RFC 2231 extended values.
//!
//! Parameters are kept as ordered `(name, value)` pairs with lower-cased
//! names, the same shape the IMAP `BODYSTRUCTURE` parameter lists use, so
//! [`lookup`] works for both sources.

use crate::charset::decode_charset;
use crate::encoding::decode_rfc2047_words;
use crate::error::Result;

/// A parameter value as found in a header or structure description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Plain value; may still contain RFC 2047 encoded-words.
    Plain(String),
    /// RFC 2231 extended value (`name*=charset'lang'%XX...`), percent-decoded.
    Extended {
        /// Declared charset, if any.
        charset: Option<String>,
        /// Raw bytes in that charset.
        bytes: Vec<u8>,
    },
}

impl ParamValue {
    /// Decodes the value to display text.
    ///
    /// Returns the text and the charset it was declared in. Plain values
    /// are run through the RFC 2047 decoder; the charset reported is that of
    /// the first encoded-word.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed encoded-words or unknown charsets.
    pub fn decode(&self) -> Result<(String, Option<String>)> {
        match self {
            Self::Plain(raw) => {
                let words = decode_rfc2047_words(raw)?;
                let charset = words.iter().find_map(|w| w.charset.clone());
                let text = words.into_iter().map(|w| w.text).collect();
                Ok((text, charset))
            }
            Self::Extended {
                charset: Some(charset),
                bytes,
            } => Ok((decode_charset(charset, bytes)?, Some(charset.clone()))),
            Self::Extended {
                charset: None,
                bytes,
            } => Ok((String::from_utf8_lossy(bytes).into_owned(), None)),
        }
    }

    /// Returns the undecoded value, for use when [`ParamValue::decode`] fails.
    #[must_use]
    pub fn raw(&self) -> String {
        match self {
            Self::Plain(raw) => raw.clone(),
            Self::Extended { bytes, .. } => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

/// Parses a `; name=value; name="quoted; value"` parameter list.
///
/// Quoted values may contain `;` and backslash escapes. Names are
/// lower-cased; malformed entries without `=` are skipped.
#[must_use]
pub fn parse_parameters(s: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();

    for segment in split_unquoted(s, ';') {
        let Some((name, value)) = segment.split_once('=') else {
            continue;
        };
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        params.push((name, unquote(value.trim())));
    }

    params
}

/// Splits on `separator` outside of double quotes.
fn split_unquoted(s: &str, separator: char) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                segments.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    segments.push(&s[start..]);
    segments
}

fn unquote(value: &str) -> String {
    let Some(inner) = value
        .strip_prefix('"')
        .map(|v| v.strip_suffix('"').unwrap_or(v))
    else {
        return value.to_string();
    };

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                result.push(next);
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn get<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Looks up parameter `name`, honoring RFC 2231 extended forms.
///
/// Resolution order: `name*` (single extended value), `name*0`/`name*0*`
/// continuations, then plain `name`.
#[must_use]
pub fn lookup(params: &[(String, String)], name: &str) -> Option<ParamValue> {
    if let Some(value) = get(params, &format!("{name}*")) {
        let (charset, encoded) = split_extended(value);
        return Some(ParamValue::Extended {
            charset,
            bytes: percent_decode(encoded),
        });
    }

    if let Some(value) = lookup_continuations(params, name) {
        return Some(value);
    }

    get(params, name).map(|v| ParamValue::Plain(v.to_string()))
}

fn lookup_continuations(params: &[(String, String)], name: &str) -> Option<ParamValue> {
    let mut charset = None;
    let mut bytes = Vec::new();
    let mut any_extended = false;
    let mut index = 0;

    loop {
        if let Some(value) = get(params, &format!("{name}*{index}*")) {
            let encoded = if index == 0 {
                let (cs, encoded) = split_extended(value);
                charset = cs;
                encoded
            } else {
                value
            };
            bytes.extend(percent_decode(encoded));
            any_extended = true;
        } else if let Some(value) = get(params, &format!("{name}*{index}")) {
            bytes.extend_from_slice(value.as_bytes());
        } else {
            break;
        }
        index += 1;
    }

    if index == 0 {
        return None;
    }
    if any_extended {
        Some(ParamValue::Extended { charset, bytes })
    } else {
        Some(ParamValue::Plain(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Splits `charset'language'value`; values without the prefix have no charset.
fn split_extended(value: &str) -> (Option<String>, &str) {
    let mut pieces = value.splitn(3, '\'');
    match (pieces.next(), pieces.next(), pieces.next()) {
        (Some(charset), Some(_language), Some(encoded)) => {
            let charset = (!charset.is_empty()).then(|| charset.to_string());
            (charset, encoded)
        }
        _ => (None, value),
    }
}

fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(byte) = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
        {
            result.push(byte);
            i += 3;
        } else {
            result.push(bytes[i]);
            i += 1;
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_parse_parameters_quoted_semicolon() {
        let parsed = parse_parameters(r#"; filename="a;b (1).txt"; size=12"#);
        assert_eq!(
            parsed,
            params(&[("filename", "a;b (1).txt"), ("size", "12")])
        );
    }

    #[test]
    fn test_parse_parameters_escaped_quote() {
        let parsed = parse_parameters(r#"; Name="say \"hi\".txt""#);
        assert_eq!(parsed, params(&[("name", r#"say "hi".txt"#)]));
    }

    #[test]
    fn test_lookup_plain() {
        let p = params(&[("filename", "report.pdf")]);
        assert_eq!(
            lookup(&p, "filename"),
            Some(ParamValue::Plain("report.pdf".to_string()))
        );
        assert_eq!(lookup(&p, "name"), None);
    }

    #[test]
    fn test_lookup_extended() {
        let p = params(&[("filename*", "UTF-8''caf%C3%A9.txt")]);
        let value = lookup(&p, "filename").unwrap();
        let (text, charset) = value.decode().unwrap();
        assert_eq!(text, "café.txt");
        assert_eq!(charset.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_lookup_continuations() {
        let p = params(&[
            ("filename*0*", "iso-8859-1'fr'r%E9sum"),
            ("filename*1", "e.pdf"),
        ]);
        let (text, charset) = lookup(&p, "filename").unwrap().decode().unwrap();
        assert_eq!(text, "résume.pdf");
        assert_eq!(charset.as_deref(), Some("iso-8859-1"));
    }

    #[test]
    fn test_lookup_plain_continuations() {
        let p = params(&[("name*0", "long-"), ("name*1", "name.txt")]);
        assert_eq!(
            lookup(&p, "name"),
            Some(ParamValue::Plain("long-name.txt".to_string()))
        );
    }

    #[test]
    fn test_plain_value_with_encoded_word() {
        let value = ParamValue::Plain("=?ISO-8859-1?Q?caf=E9.txt?=".to_string());
        let (text, charset) = value.decode().unwrap();
        assert_eq!(text, "café.txt");
        assert_eq!(charset.as_deref(), Some("ISO-8859-1"));
    }
}
