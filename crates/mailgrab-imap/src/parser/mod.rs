//! IMAP data parser.
//!
//! A sans-I/O parser for the parts of server responses needed to discover
//! attachments.
//!
//! # Architecture
//!
//! - **Lexer**: Tokenizes raw bytes into IMAP tokens (atoms, strings, numbers, etc.)
//! - **Value reader**: Builds a generic tree of nested lists from tokens
//! - **Structure parser**: Interprets a `BODYSTRUCTURE` tree as [`PartNode`]s
//!
//! # Example
//!
//! ```
//! use mailgrab_imap::parser::parse_structure;
//!
//! let raw = r#"("text" "plain" ("charset" "utf-8") NIL NIL "7bit" 12 1)"#;
//! let node = parse_structure(raw).unwrap();
//! assert!(node.is_leaf());
//! assert_eq!(node.mime_type_string(), "text/plain");
//! ```

pub mod lexer;

mod fetch;
mod structure;
mod value;

pub use fetch::{FetchedStructure, extract_body_structures};
pub use lexer::{Lexer, Token};
pub use structure::{PartKind, PartNode, parse_structure};
pub use value::{MAX_LIST_DEPTH, Value, parse_value, read_value};
