//! Content-Disposition handling (RFC 2183).

use crate::params::{ParamValue, lookup, parse_parameters};

/// Intended handling of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Disposition {
    /// Displayed as part of the message.
    Inline,
    /// Separate file for the user to save.
    Attachment,
    /// No disposition given, or one this crate does not know.
    #[default]
    None,
}

impl Disposition {
    /// Maps a disposition type name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("attachment") {
            Self::Attachment
        } else if name.eq_ignore_ascii_case("inline") {
            Self::Inline
        } else {
            Self::None
        }
    }

    /// Returns true for [`Disposition::Attachment`].
    #[must_use]
    pub const fn is_attachment(self) -> bool {
        matches!(self, Self::Attachment)
    }
}

/// Parsed `Content-Disposition` header value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentDisposition {
    /// Disposition type.
    pub disposition: Disposition,
    /// Parameters in header order, names lower-cased.
    pub parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Parses `attachment; filename="a.txt"`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (name, params) = s.split_once(';').unwrap_or((s, ""));
        Self {
            disposition: Disposition::from_name(name),
            parameters: parse_parameters(params),
        }
    }

    /// Returns the `filename` parameter, resolving RFC 2231 forms.
    #[must_use]
    pub fn filename(&self) -> Option<ParamValue> {
        lookup(&self.parameters, "filename")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Disposition::from_name("ATTACHMENT"), Disposition::Attachment);
        assert_eq!(Disposition::from_name(" inline "), Disposition::Inline);
        assert_eq!(Disposition::from_name("form-data"), Disposition::None);
    }

    #[test]
    fn test_parse_attachment() {
        let cd = ContentDisposition::parse("attachment; filename=\"notes (v2).txt\"");
        assert!(cd.disposition.is_attachment());
        assert_eq!(
            cd.filename(),
            Some(ParamValue::Plain("notes (v2).txt".to_string()))
        );
    }

    #[test]
    fn test_parse_bare_inline() {
        let cd = ContentDisposition::parse("inline");
        assert_eq!(cd.disposition, Disposition::Inline);
        assert!(cd.filename().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_disposition_serde_lowercase() {
        let json = serde_json::to_string(&Disposition::Attachment).unwrap();
        assert_eq!(json, "\"attachment\"");

        let parsed: Disposition = serde_json::from_str("\"inline\"").unwrap();
        assert_eq!(parsed, Disposition::Inline);
        assert!(serde_json::from_str::<Disposition>("\"form-data\"").is_err());
    }
}
