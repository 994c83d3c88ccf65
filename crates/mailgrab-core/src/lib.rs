//! # mailgrab-core
//!
//! Attachment discovery and extraction for remote mailboxes.
//!
//! This crate provides:
//! - **Indexing** - Turn `BODYSTRUCTURE` descriptions into attachment
//!   locators without downloading message bodies
//! - **Resolution** - Find the part a locator names in a downloaded message
//!   and return its decoded bytes
//! - **Service** - Both steps over any transport implementing
//!   [`MailSource`]
//!
//! Locators select parts by ordinal: the position of the part among the
//! message's attachments in depth-first order. Indexing and resolution walk
//! their trees with the same [`traversal`] code, so duplicate filenames
//! never pick the wrong part.
//!
//! ```
//! use mailgrab_core::{AttachmentIndexBuilder, IndexConfig};
//! use mailgrab_imap::MessageId;
//!
//! let structure = concat!(
//!     r#"(("text" "plain" NIL NIL NIL "7bit" 5 1)"#,
//!     r#"("text" "plain" NIL NIL NIL "base64" 8 1 NIL ("attachment" ("filename" "a.txt")) NIL)"#,
//!     r#" "mixed")"#,
//! );
//! let builder = AttachmentIndexBuilder::new(IndexConfig::default());
//! let index = builder.build([(MessageId::new("7").unwrap(), structure)]);
//!
//! assert_eq!(index.locators.len(), 1);
//! assert_eq!(index.locators[0].filename, "a.txt");
//! assert_eq!(index.locators[0].ordinal, 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod index;
pub mod locator;
pub mod resolver;
pub mod service;
pub mod traversal;

pub use config::{AttachmentPolicy, IndexConfig, IndexConfigBuilder};
pub use error::{Error, Result};
pub use index::{AttachmentIndex, AttachmentIndexBuilder, SkippedMessage};
pub use locator::{AttachmentBytes, AttachmentLocator};
pub use resolver::PartResolver;
pub use service::{AttachmentService, MailSource};
pub use traversal::{MimeNode, attachment_leaves};
