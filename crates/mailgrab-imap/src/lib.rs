//! # mailgrab-imap
//!
//! IMAP-side data for attachment discovery: message identifier sets and a
//! sans-I/O parser for `BODYSTRUCTURE` (RFC 9051 §7.5.2).
//!
//! ## Features
//!
//! - **Identifier sets**: Build [`MessageIdSet`]s from `SEARCH` results and
//!   turn them into comma-joined wire tokens for `FETCH`
//! - **Grammar-aware parsing**: Quoted strings, escapes, literals and `NIL`
//!   are handled by a real lexer, so filenames containing parentheses or
//!   quotes never confuse the structure
//! - **Typed part trees**: [`PartNode`] with media type, parameters and
//!   disposition for every part
//! - **FETCH extraction**: Pull the raw `BODYSTRUCTURE` text out of
//!   untagged `FETCH` responses
//!
//! ## Quick Start
//!
//! ```
//! use mailgrab_imap::{MessageIdSet, WireResult, parse_structure};
//!
//! let ids = MessageIdSet::from_wire_result(WireResult::ok("1 3 7")).unwrap();
//! assert_eq!(ids.to_wire_token(), "1,3,7");
//!
//! let raw = concat!(
//!     r#"(("text" "plain" NIL NIL NIL "7bit" 5 1)"#,
//!     r#"("application" "pdf" NIL NIL NIL "base64" 900 NIL"#,
//!     r#" ("attachment" ("filename" "q3 (final).pdf")) NIL) "mixed")"#,
//! );
//! let root = parse_structure(raw).unwrap();
//! assert_eq!(root.children.len(), 2);
//! assert!(root.children[1].disposition.is_attachment());
//! ```
//!
//! ## Modules
//!
//! - [`parser`]: Lexer, value reader and structure parser
//! - [`types`]: Message identifiers, identifier sets and transport results

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use parser::{FetchedStructure, PartKind, PartNode, extract_body_structures, parse_structure};
pub use types::{MessageId, MessageIdSet, SeqNum, Status, WireResult};
