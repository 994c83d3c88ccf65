//! Generic parenthesized value trees.
//!
//! `BODYSTRUCTURE` and `FETCH` data are nested lists of atoms, strings,
//! numbers and `NIL`. Reading them into a [`Value`] first keeps quoting and
//! nesting concerns out of the interpretation code.

use super::lexer::{Lexer, Token};
use crate::Result;

/// Maximum list nesting accepted by the reader.
pub const MAX_LIST_DEPTH: usize = 64;

/// A parsed IMAP data value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `NIL`.
    Nil,
    /// Unquoted atom.
    Atom(String),
    /// Quoted string or literal.
    String(String),
    /// Number.
    Number(u32),
    /// Parenthesized list.
    List(Vec<Value>),
}

impl Value {
    /// Returns the text of a quoted string or literal.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a string, literal or atom.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Atom(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the number, if this is one.
    #[must_use]
    pub const fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns true for `NIL`.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true for lists.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

/// Parses exactly one value from `input`.
///
/// Surrounding whitespace is allowed; anything else after the value is an
/// error.
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] on malformed, unbalanced, too deeply
/// nested or trailing input.
pub fn parse_value(input: &[u8]) -> Result<Value> {
    let mut lexer = Lexer::new(input);
    let value = read_value(&mut lexer)?;

    match lexer.next_significant()? {
        Token::Eof => Ok(value),
        token => Err(lexer.error(&format!("Trailing data after value: {token:?}"))),
    }
}

/// Reads the next value from the lexer, skipping leading separators.
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] on malformed or too deeply nested input.
pub fn read_value(lexer: &mut Lexer<'_>) -> Result<Value> {
    let token = lexer.next_significant()?;
    value_from_token(lexer, token, 0)
}

fn value_from_token(lexer: &mut Lexer<'_>, token: Token<'_>, depth: usize) -> Result<Value> {
    match token {
        Token::Nil => Ok(Value::Nil),
        Token::Atom(s) => Ok(Value::Atom(s.to_string())),
        Token::QuotedString(s) => Ok(Value::String(s)),
        Token::Literal(data) => Ok(Value::String(
            String::from_utf8_lossy(&data).into_owned(),
        )),
        Token::Number(n) => Ok(Value::Number(n)),
        Token::LParen => read_list(lexer, depth + 1),
        Token::Eof => Err(lexer.error("Unexpected end of input")),
        token => Err(lexer.error(&format!("Unexpected token: {token:?}"))),
    }
}

fn read_list(lexer: &mut Lexer<'_>, depth: usize) -> Result<Value> {
    if depth > MAX_LIST_DEPTH {
        return Err(lexer.error(&format!("List nesting deeper than {MAX_LIST_DEPTH}")));
    }

    let mut items = Vec::new();
    loop {
        match lexer.next_significant()? {
            Token::RParen => return Ok(Value::List(items)),
            Token::Eof => return Err(lexer.error("Unterminated list")),
            token => items.push(value_from_token(lexer, token, depth)?),
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
    use crate::Error;

    #[test]
    fn test_scalars() {
        assert_eq!(parse_value(b"NIL").unwrap(), Value::Nil);
        assert_eq!(parse_value(b" 42 ").unwrap(), Value::Number(42));
        assert_eq!(
            parse_value(b"\"x y\"").unwrap(),
            Value::String("x y".to_string())
        );
        assert_eq!(
            parse_value(b"BASE64").unwrap(),
            Value::Atom("BASE64".to_string())
        );
    }

    #[test]
    fn test_nested_list() {
        let value = parse_value(b"(\"a\" (1 NIL) ())").unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::String("a".to_string()),
                Value::List(vec![Value::Number(1), Value::Nil]),
                Value::List(vec![]),
            ])
        );
    }

    #[test]
    fn test_literal_in_list() {
        let value = parse_value(b"(\"name\" {7}\r\nx (y).z)").unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items[1].as_string(), Some("x (y).z"));
    }

    #[test]
    fn test_line_breaks_inside_list() {
        let value = parse_value(b"(1\r\n 2)").unwrap();
        assert_eq!(value.as_list().unwrap().len(), 2);
    }

    #[test]
    fn test_unbalanced() {
        assert!(matches!(parse_value(b"((1)"), Err(Error::Parse { .. })));
        assert!(matches!(parse_value(b")"), Err(Error::Parse { .. })));
        assert!(matches!(parse_value(b""), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_trailing_data() {
        assert!(matches!(parse_value(b"(1) 2"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let ok = format!("{}{}", "(".repeat(MAX_LIST_DEPTH), ")".repeat(MAX_LIST_DEPTH));
        assert!(parse_value(ok.as_bytes()).is_ok());

        let deep = format!(
            "{}{}",
            "(".repeat(MAX_LIST_DEPTH + 1),
            ")".repeat(MAX_LIST_DEPTH + 1)
        );
        assert!(matches!(
            parse_value(deep.as_bytes()),
            Err(Error::Parse { .. })
        ));
    }
}
