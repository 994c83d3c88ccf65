//! # mailgrab-mime
//!
//! MIME message parsing and header decoding for attachment extraction.
//!
//! ## Features
//!
//! - **Message parsing**: Parse raw messages into a tree of parts with
//!   nested multipart support
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded-words in any
//!   charset known to `encoding_rs`
//! - **Parameters**: Quote-aware parameter lists and RFC 2231 extended values
//! - **Dispositions**: `Content-Disposition` parsing (RFC 2183)
//!
//! ## Quick Start
//!
//! ### Parsing MIME Messages
//!
//! ```
//! use mailgrab_mime::Message;
//!
//! let raw = b"Subject: Test\r\nContent-Transfer-Encoding: base64\r\n\r\nSGVsbG8sIFdvcmxkIQ==";
//! let message = Message::parse(raw).unwrap();
//! assert_eq!(message.headers().get("subject"), Some("Test"));
//! assert_eq!(message.root().decode_body().unwrap(), b"Hello, World!");
//! ```
//!
//! ### Decoding header words
//!
//! ```
//! use mailgrab_mime::encoding::decode_rfc2047_words;
//!
//! let words = decode_rfc2047_words("=?ISO-8859-1?Q?caf=E9.txt?=").unwrap();
//! assert_eq!(words[0].text, "café.txt");
//! assert_eq!(words[0].charset.as_deref(), Some("ISO-8859-1"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod charset;
mod content_type;
mod disposition;
mod error;
mod header;
mod message;
mod params;

pub mod encoding;

pub use charset::{decode_charset, decode_header_bytes};
pub use content_type::ContentType;
pub use disposition::{ContentDisposition, Disposition};
pub use encoding::DecodedWord;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{MAX_NESTING_DEPTH, Message, Part, TransferEncoding};
pub use params::{ParamValue, lookup as lookup_parameter, parse_parameters};
