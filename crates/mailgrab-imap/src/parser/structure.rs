//! `BODYSTRUCTURE` interpretation (RFC 9051 §7.5.2).
//!
//! A structure description is read into a [`Value`] tree and then
//! interpreted:
//!
//! ```text
//! multipart: (child child ... "subtype" [params [disposition [language ...]]])
//! leaf:      ("type" "subtype" params id description encoding size ...)
//! ```
//!
//! Extension data differs between leaf kinds (`text/*` has a line count,
//! `message/rfc822` an envelope and nested body), so the disposition is
//! found by scanning the trailing elements for a `(name params)` pair
//! instead of by fixed position.

use mailgrab_mime::{Disposition, ParamValue, lookup_parameter};

use super::value::{Value, parse_value};
use crate::{Error, Result};

/// Kind of a body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Single part with content.
    Leaf,
    /// Container of child parts.
    Multipart,
}

/// One node of a parsed `BODYSTRUCTURE` tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartNode {
    /// Leaf or multipart.
    pub kind: PartKind,
    /// Lower-cased media type (`multipart` for containers).
    pub mime_type: String,
    /// Lower-cased media subtype.
    pub mime_subtype: String,
    /// Content-type parameters, names lower-cased.
    pub parameters: Vec<(String, String)>,
    /// Content disposition.
    pub disposition: Disposition,
    /// Disposition parameters, names lower-cased.
    pub disposition_parameters: Vec<(String, String)>,
    /// Content-ID (leaves only).
    pub content_id: Option<String>,
    /// Content-Description (leaves only).
    pub description: Option<String>,
    /// Content-Transfer-Encoding (leaves only).
    pub encoding: Option<String>,
    /// Encoded size in octets (leaves only).
    pub size: Option<u32>,
    /// Child parts (multipart only).
    pub children: Vec<Self>,
}

impl PartNode {
    /// Returns true for leaf parts.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.kind == PartKind::Leaf
    }

    /// Returns true for multipart containers.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.kind == PartKind::Multipart
    }

    /// Returns `type/subtype`.
    #[must_use]
    pub fn mime_type_string(&self) -> String {
        format!("{}/{}", self.mime_type, self.mime_subtype)
    }

    /// Looks up a content-type parameter, resolving RFC 2231 forms.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<ParamValue> {
        lookup_parameter(&self.parameters, name)
    }

    /// Looks up a disposition parameter, resolving RFC 2231 forms.
    #[must_use]
    pub fn disposition_parameter(&self, name: &str) -> Option<ParamValue> {
        lookup_parameter(&self.disposition_parameters, name)
    }

    /// Returns the filename: disposition `filename`, else content-type `name`.
    #[must_use]
    pub fn filename(&self) -> Option<ParamValue> {
        self.disposition_parameter("filename")
            .or_else(|| self.parameter("name"))
    }

    /// Parses a raw structure description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed, unbalanced or trailing input
    /// and [`Error::InvalidStructure`] for well-formed data that does not
    /// describe a body.
    pub fn parse(raw: &str) -> Result<Self> {
        parse_structure(raw)
    }

    /// Interprets an already-read value tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStructure`] if the value does not describe a
    /// body.
    pub fn from_value(value: &Value) -> Result<Self> {
        let fields = value
            .as_list()
            .filter(|fields| !fields.is_empty())
            .ok_or_else(|| invalid("expected a non-empty parenthesized body"))?;

        if fields[0].is_list() {
            Self::multipart(fields)
        } else {
            Self::leaf(fields)
        }
    }

    fn multipart(fields: &[Value]) -> Result<Self> {
        let child_count = fields.iter().take_while(|v| v.is_list()).count();
        let children = fields[..child_count]
            .iter()
            .map(Self::from_value)
            .collect::<Result<Vec<_>>>()?;

        let rest = &fields[child_count..];
        let subtype = rest
            .first()
            .and_then(Value::as_text)
            .ok_or_else(|| invalid("multipart body without subtype"))?;

        let parameters = rest.get(1).map(parameter_list).transpose()?.unwrap_or_default();
        let (disposition, disposition_parameters) = find_disposition(rest.get(2..))?;

        Ok(Self {
            kind: PartKind::Multipart,
            mime_type: "multipart".to_string(),
            mime_subtype: subtype.to_lowercase(),
            parameters,
            disposition,
            disposition_parameters,
            content_id: None,
            description: None,
            encoding: None,
            size: None,
            children,
        })
    }

    fn leaf(fields: &[Value]) -> Result<Self> {
        if fields.len() < 7 {
            return Err(invalid(&format!(
                "body part has {} fields, expected at least 7",
                fields.len()
            )));
        }

        let mime_type = fields[0]
            .as_string()
            .ok_or_else(|| invalid("body type is not a string"))?;
        let mime_subtype = fields[1]
            .as_string()
            .ok_or_else(|| invalid("body subtype is not a string"))?;

        let (disposition, disposition_parameters) = find_disposition(fields.get(7..))?;

        Ok(Self {
            kind: PartKind::Leaf,
            mime_type: mime_type.to_lowercase(),
            mime_subtype: mime_subtype.to_lowercase(),
            parameters: parameter_list(&fields[2])?,
            disposition,
            disposition_parameters,
            content_id: nstring(&fields[3]),
            description: nstring(&fields[4]),
            encoding: nstring(&fields[5]),
            size: fields[6].as_number(),
            children: Vec::new(),
        })
    }
}

/// Parses a raw structure description into a [`PartNode`] tree.
///
/// # Errors
///
/// See [`PartNode::parse`].
pub fn parse_structure(raw: &str) -> Result<PartNode> {
    let value = parse_value(raw.as_bytes())?;
    PartNode::from_value(&value)
}

fn invalid(message: &str) -> Error {
    Error::InvalidStructure(message.to_string())
}

fn nstring(value: &Value) -> Option<String> {
    value.as_text().map(ToString::to_string)
}

/// Reads `("name" "value" ...)` or `NIL`.
fn parameter_list(value: &Value) -> Result<Vec<(String, String)>> {
    let items = match value {
        Value::Nil => return Ok(Vec::new()),
        Value::List(items) => items,
        _ => return Err(invalid("parameter list is neither a list nor NIL")),
    };

    if !items.len().is_multiple_of(2) {
        return Err(invalid("parameter list has an odd number of elements"));
    }

    items
        .chunks_exact(2)
        .map(|pair| {
            let name = pair[0]
                .as_text()
                .ok_or_else(|| invalid("parameter name is not a string"))?;
            let value = match &pair[1] {
                Value::Number(n) => n.to_string(),
                other => other.as_text().unwrap_or_default().to_string(),
            };
            Ok((name.to_lowercase(), value))
        })
        .collect()
}

/// Finds the first `("name" (params))` or `("name" NIL)` element.
fn find_disposition(
    candidates: Option<&[Value]>,
) -> Result<(Disposition, Vec<(String, String)>)> {
    let found = candidates.unwrap_or_default().iter().find_map(|value| {
        match value.as_list()? {
            [name, params @ (Value::List(_) | Value::Nil)] => {
                name.as_string().map(|name| (name, params))
            }
            _ => None,
        }
    });

    match found {
        Some((name, params)) => Ok((Disposition::from_name(name), parameter_list(params)?)),
        None => Ok((Disposition::None, Vec::new())),
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
    use proptest::prelude::*;

    const MIXED: &str = concat!(
        r#"(("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 12 1 NIL NIL NIL NIL)"#,
        r#"("application" "pdf" ("name" "report.pdf") NIL NIL "base64" 4096 NIL"#,
        r#" ("attachment" ("filename" "report.pdf")) NIL NIL)"#,
        r#" "mixed" ("boundary" "b1") NIL NIL NIL)"#
    );

    #[test]
    fn test_single_leaf() {
        let node =
            parse_structure(r#"("TEXT" "PLAIN" ("CHARSET" "US-ASCII") NIL NIL "7BIT" 42 3)"#)
                .unwrap();
        assert!(node.is_leaf());
        assert_eq!(node.mime_type_string(), "text/plain");
        assert_eq!(
            node.parameters,
            vec![("charset".to_string(), "US-ASCII".to_string())]
        );
        assert_eq!(node.encoding.as_deref(), Some("7BIT"));
        assert_eq!(node.size, Some(42));
        assert_eq!(node.disposition, Disposition::None);
    }

    #[test]
    fn test_multipart_mixed() {
        let node = parse_structure(MIXED).unwrap();
        assert!(node.is_multipart());
        assert_eq!(node.mime_subtype, "mixed");
        assert_eq!(node.parameters, vec![("boundary".to_string(), "b1".to_string())]);
        assert_eq!(node.children.len(), 2);

        let pdf = &node.children[1];
        assert_eq!(pdf.mime_type_string(), "application/pdf");
        assert_eq!(pdf.disposition, Disposition::Attachment);
        assert_eq!(
            pdf.filename(),
            Some(ParamValue::Plain("report.pdf".to_string()))
        );
        assert_eq!(node.children[0].disposition, Disposition::None);
    }

    #[test]
    fn test_nested_multipart() {
        let raw = concat!(
            r#"((("text" "plain" NIL NIL NIL "7bit" 5 1)"#,
            r#"("text" "html" NIL NIL NIL "7bit" 9 1) "alternative")"#,
            r#"("image" "png" NIL NIL NIL "base64" 100 NIL ("inline" NIL)) "related")"#
        );
        let node = parse_structure(raw).unwrap();
        assert_eq!(node.mime_subtype, "related");
        assert_eq!(node.children[0].mime_subtype, "alternative");
        assert_eq!(node.children[0].children.len(), 2);
        assert_eq!(node.children[1].disposition, Disposition::Inline);
        assert!(node.children[1].disposition_parameters.is_empty());
    }

    #[test]
    fn test_disposition_case_insensitive() {
        let raw = r#"("application" "zip" NIL NIL NIL "base64" 10 NIL ("ATTACHMENT" ("FILENAME" "a.zip")) NIL)"#;
        let node = parse_structure(raw).unwrap();
        assert_eq!(node.disposition, Disposition::Attachment);
        assert_eq!(
            node.disposition_parameters,
            vec![("filename".to_string(), "a.zip".to_string())]
        );
    }

    #[test]
    fn test_unknown_disposition_is_none() {
        let raw = r#"("application" "zip" NIL NIL NIL "base64" 10 NIL ("form-data" ("name" "f")) NIL)"#;
        assert_eq!(parse_structure(raw).unwrap().disposition, Disposition::None);
    }

    #[test]
    fn test_message_rfc822_leaf() {
        let raw = concat!(
            r#"("message" "rfc822" NIL NIL NIL "7bit" 300"#,
            r#" ("date" "subj" NIL NIL NIL NIL NIL NIL NIL "<id@x>")"#,
            r#" ("text" "plain" NIL NIL NIL "7bit" 20 2) 10 NIL ("attachment" ("filename" "fwd.eml")) NIL)"#
        );
        let node = parse_structure(raw).unwrap();
        assert!(node.is_leaf());
        assert_eq!(node.disposition, Disposition::Attachment);
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_rfc2231_disposition_parameter() {
        let raw = r#"("application" "pdf" NIL NIL NIL "base64" 10 NIL ("attachment" ("filename*" "utf-8''caf%C3%A9.pdf")) NIL)"#;
        let node = parse_structure(raw).unwrap();
        let (name, charset) = node.filename().unwrap().decode().unwrap();
        assert_eq!(name, "café.pdf");
        assert_eq!(charset.as_deref(), Some("utf-8"));
    }

    #[test]
    fn test_too_few_fields() {
        let result = parse_structure(r#"("text" "plain" NIL NIL "7bit" 5)"#);
        assert!(matches!(result, Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_type_not_string() {
        let result = parse_structure(r#"(NIL "plain" NIL NIL NIL "7bit" 5)"#);
        assert!(matches!(result, Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_multipart_without_subtype() {
        let result = parse_structure(r#"(("text" "plain" NIL NIL NIL "7bit" 5 1))"#);
        assert!(matches!(result, Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_truncated_and_trailing() {
        assert!(matches!(
            parse_structure(&MIXED[..MIXED.len() - 10]),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            parse_structure(&format!("{MIXED} extra")),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_reparse_is_identical() {
        assert_eq!(parse_structure(MIXED).unwrap(), parse_structure(MIXED).unwrap());
    }

    fn quote(s: &str) -> String {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    }

    proptest! {
        #[test]
        fn filenames_with_specials_survive(name in r#"[a-zA-Z0-9 ()"\\._-]{1,40}"#) {
            let raw = format!(
                r#"(("text" "plain" NIL NIL NIL "7bit" 1 1)("application" "octet-stream" ("name" {q}) NIL NIL "base64" 8 NIL ("attachment" ("filename" {q})) NIL) "mixed")"#,
                q = quote(&name)
            );
            let node = parse_structure(&raw).unwrap();
            prop_assert_eq!(node.children.len(), 2);
            let leaf = &node.children[1];
            prop_assert_eq!(leaf.disposition, Disposition::Attachment);
            prop_assert_eq!(leaf.filename(), Some(ParamValue::Plain(name)));
        }
    }
}
