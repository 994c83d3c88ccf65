//! Extraction of `BODYSTRUCTURE` items from untagged `FETCH` responses.

use super::lexer::{Lexer, Token};
use super::value::read_value;
use crate::Result;
use crate::types::{MessageId, SeqNum};

/// Structure description of one message as found in a `FETCH` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedStructure {
    /// Message sequence number.
    pub sequence: SeqNum,
    /// UID, when the response carried one.
    pub uid: Option<MessageId>,
    /// Exact `BODYSTRUCTURE` text, ready for [`super::parse_structure`].
    pub raw: String,
}

/// Collects the `BODYSTRUCTURE` of every `FETCH` response in `response`.
///
/// Accepts lines such as `* 12 FETCH (UID 7 BODYSTRUCTURE (...))`, with or
/// without the leading `*`. Other untagged data and the tagged completion
/// line are skipped, as are `FETCH` responses without a `BODYSTRUCTURE`
/// item (unsolicited flag updates, for instance).
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] if a `FETCH` response is malformed.
pub fn extract_body_structures(response: &str) -> Result<Vec<FetchedStructure>> {
    let mut lexer = Lexer::new(response.as_bytes());
    let mut structures = Vec::new();

    loop {
        lexer.skip_separators();
        if lexer.is_eof() {
            break;
        }

        if lexer.peek() == Some(b'*') {
            lexer.expect(Token::Asterisk)?;
            lexer.expect_space()?;
        }

        let Some(b'0'..=b'9') = lexer.peek() else {
            // Tagged status line or untagged data without a number
            lexer.skip_line();
            continue;
        };

        let number = lexer.read_number()?;
        lexer.expect_space()?;
        if !lexer.read_atom_string()?.eq_ignore_ascii_case("FETCH") {
            // EXISTS, EXPUNGE, RECENT ...
            lexer.skip_line();
            continue;
        }
        lexer.expect_space()?;

        let sequence =
            SeqNum::new(number).ok_or_else(|| lexer.error("Sequence number 0 in FETCH"))?;
        match read_fetch_items(&mut lexer, response, sequence)? {
            Some(structure) => structures.push(structure),
            None => tracing::debug!(%sequence, "FETCH response without BODYSTRUCTURE"),
        }
    }

    Ok(structures)
}

fn read_fetch_items(
    lexer: &mut Lexer<'_>,
    response: &str,
    sequence: SeqNum,
) -> Result<Option<FetchedStructure>> {
    lexer.expect(Token::LParen)?;

    let mut uid = None;
    let mut raw = None;

    loop {
        let name = match lexer.next_significant()? {
            Token::RParen => break,
            Token::Atom(name) => name,
            token => return Err(lexer.error(&format!("Expected FETCH item, got {token:?}"))),
        };

        // BODY[section]<origin>
        if lexer.peek() == Some(b'[') {
            skip_section(lexer)?;
        }

        if name.eq_ignore_ascii_case("BODYSTRUCTURE") {
            lexer.skip_separators();
            let start = lexer.position();
            read_value(lexer)?;
            let end = lexer.position();
            let text = response
                .get(start..end)
                .ok_or_else(|| lexer.error("BODYSTRUCTURE is not valid text"))?;
            raw = Some(text.to_string());
        } else if name.eq_ignore_ascii_case("UID") {
            let value = read_value(lexer)?;
            let id = value
                .as_number()
                .ok_or_else(|| lexer.error("UID is not a number"))?;
            uid = Some(MessageId::new(id.to_string())?);
        } else {
            read_value(lexer)?;
        }
    }

    Ok(raw.map(|raw| FetchedStructure { sequence, uid, raw }))
}

fn skip_section(lexer: &mut Lexer<'_>) -> Result<()> {
    lexer.expect(Token::LBracket)?;
    loop {
        match lexer.next_token()? {
            Token::RBracket => break,
            Token::Eof => return Err(lexer.error("Unterminated section")),
            _ => {}
        }
    }
    // Partial fetch origin such as <0>
    if lexer.peek() == Some(b'<') {
        lexer.read_atom_string()?;
    }
    Ok(())
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
    use crate::Error;
    use crate::parser::parse_structure;

    const LEAF: &str = r#"("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 5 1 NIL NIL NIL NIL)"#;

    #[test]
    fn test_single_response() {
        let response = format!("* 12 FETCH (UID 7 BODYSTRUCTURE {LEAF})\r\n");
        let structures = extract_body_structures(&response).unwrap();

        assert_eq!(structures.len(), 1);
        assert_eq!(structures[0].sequence.get(), 12);
        assert_eq!(structures[0].uid.as_ref().unwrap().as_str(), "7");
        assert_eq!(structures[0].raw, LEAF);
        assert!(parse_structure(&structures[0].raw).is_ok());
    }

    #[test]
    fn test_multiple_responses_and_status_line() {
        let response = format!(
            "* 1 FETCH (BODYSTRUCTURE {LEAF} UID 10)\r\n\
             * 3 EXISTS\r\n\
             2 FETCH (FLAGS (\\Seen) UID 11 BODYSTRUCTURE {LEAF})\r\n\
             * 4 FETCH (FLAGS (\\Deleted))\r\n\
             A004 OK FETCH completed\r\n"
        );
        let structures = extract_body_structures(&response).unwrap();

        let uids: Vec<_> = structures
            .iter()
            .map(|s| s.uid.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(uids, vec!["10", "11"]);
        assert_eq!(structures[1].sequence.get(), 2);
    }

    #[test]
    fn test_other_items_with_literals_and_sections() {
        let response = format!(
            "* 5 FETCH (INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" \
             BODY[HEADER.FIELDS (SUBJECT)]<0> {{14}}\r\nSubject: (x)\r\n \
             RFC822.SIZE 44827 BODYSTRUCTURE {LEAF})\r\n"
        );
        let structures = extract_body_structures(&response).unwrap();
        assert_eq!(structures.len(), 1);
        assert!(structures[0].uid.is_none());
        assert_eq!(structures[0].raw, LEAF);
    }

    #[test]
    fn test_empty_response() {
        assert!(extract_body_structures("").unwrap().is_empty());
        assert!(
            extract_body_structures("A1 OK done\r\n")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_unbalanced_fetch() {
        let response = "* 1 FETCH (UID 3 BODYSTRUCTURE (\"text\" \"plain\"\r\n";
        assert!(matches!(
            extract_body_structures(response),
            Err(Error::Parse { .. })
        ));
    }
}
