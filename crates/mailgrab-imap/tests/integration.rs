//! Integration tests for identifier sets and structure parsing.
//!
//! These tests feed captured-style server output through the public API
//! the way a transport would.

use mailgrab_imap::{
    Error, MessageIdSet, PartNode, Status, WireResult, extract_body_structures, parse_structure,
};
use mailgrab_mime::Disposition;

/// A `UID FETCH 1,3 (UID BODYSTRUCTURE)` reply with one plain message and one
/// message carrying two attachments, one inside a nested multipart.
const FETCH_REPLY: &str = concat!(
    "* 1 FETCH (UID 1 BODYSTRUCTURE (\"text\" \"plain\" (\"charset\" \"utf-8\") NIL NIL \"7bit\" 24 2 NIL NIL NIL NIL))\r\n",
    "* 2 FETCH (UID 3 BODYSTRUCTURE (((\"text\" \"plain\" (\"charset\" \"utf-8\") NIL NIL \"quoted-printable\" 120 4 NIL NIL NIL NIL)",
    "(\"text\" \"html\" (\"charset\" \"utf-8\") NIL NIL \"quoted-printable\" 410 9 NIL NIL NIL NIL) \"alternative\" (\"boundary\" \"alt\") NIL NIL NIL)",
    "(\"application\" \"pdf\" (\"name\" \"Q3 (final).pdf\") NIL NIL \"base64\" 52110 NIL (\"attachment\" (\"filename\" \"Q3 (final).pdf\")) NIL NIL)",
    "(\"text\" \"csv\" (\"charset\" \"us-ascii\" \"name\" {14}\r\n\"raw\" data.csv) NIL NIL \"base64\" 88 2 NIL (\"attachment\" NIL) NIL NIL)",
    " \"mixed\" (\"boundary\" \"outer\") NIL (\"en\") NIL))\r\n",
    "A7 OK UID FETCH completed\r\n",
);

fn attachment_leaves(node: &PartNode) -> Vec<&PartNode> {
    if node.is_leaf() {
        return if node.disposition.is_attachment() {
            vec![node]
        } else {
            Vec::new()
        };
    }
    node.children.iter().flat_map(attachment_leaves).collect()
}

#[test]
fn search_result_to_fetch_token() {
    let ids = MessageIdSet::from_wire_result(WireResult::ok("1 3")).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids.to_wire_token(), "1,3");
}

#[test]
fn empty_search_result_gives_empty_token() {
    let ids = MessageIdSet::from_wire_result(WireResult::ok("")).unwrap();
    assert!(ids.is_empty());
    assert_eq!(ids.to_wire_token(), "");
}

#[test]
fn failed_search_is_an_error() {
    let result = MessageIdSet::from_wire_result(WireResult::new(Status::No, "[TRYCREATE]"));
    assert!(matches!(result, Err(Error::MalformedResponse(_))));
}

#[test]
fn fetch_reply_parses_into_part_trees() {
    let structures = extract_body_structures(FETCH_REPLY).unwrap();
    assert_eq!(structures.len(), 2);

    let plain = parse_structure(&structures[0].raw).unwrap();
    assert!(plain.is_leaf());
    assert!(attachment_leaves(&plain).is_empty());

    let mixed = parse_structure(&structures[1].raw).unwrap();
    assert_eq!(structures[1].uid.as_ref().unwrap().as_str(), "3");
    assert_eq!(mixed.mime_subtype, "mixed");
    assert_eq!(mixed.children[0].mime_subtype, "alternative");

    let attachments = attachment_leaves(&mixed);
    assert_eq!(attachments.len(), 2);

    let (pdf_name, _) = attachments[0].filename().unwrap().decode().unwrap();
    assert_eq!(pdf_name, "Q3 (final).pdf");

    let csv = attachments[1];
    assert_eq!(csv.disposition, Disposition::Attachment);
    assert!(csv.disposition_parameters.is_empty());
    let (csv_name, _) = csv.filename().unwrap().decode().unwrap();
    assert_eq!(csv_name, "\"raw\" data.csv");
}

#[test]
fn malformed_structure_is_reported() {
    let result = parse_structure("((\"text\" \"plain\" NIL NIL NIL \"7bit\" 1 1) \"mixed\"");
    assert!(matches!(result, Err(Error::Parse { .. })));
}
