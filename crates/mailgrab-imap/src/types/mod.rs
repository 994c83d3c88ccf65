//! Core IMAP types.
//!
//! Message identifiers, identifier sets and transport results.

#![allow(clippy::missing_const_for_fn)]

mod identifiers;
mod sequence;
mod status;

pub use identifiers::{MessageId, SeqNum};
pub use sequence::MessageIdSet;
pub use status::{Status, WireResult};
