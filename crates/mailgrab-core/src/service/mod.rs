//! Attachment service over a mail transport.
//!
//! This module provides the service layer that bridges an IMAP session
//! with attachment indexing and extraction. The session itself (login,
//! folder selection, wire commands) lives behind [`MailSource`].

use std::future::Future;

use mailgrab_imap::{MessageId, MessageIdSet};
use tracing::debug;

use crate::config::IndexConfig;
use crate::index::{AttachmentIndex, AttachmentIndexBuilder};
use crate::locator::{AttachmentBytes, AttachmentLocator};
use crate::resolver::PartResolver;
use crate::{Error, Result};

/// The two transport primitives the service needs.
///
/// Implementations wrap an authenticated session with a folder selected.
pub trait MailSource {
    /// Transport failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the structure description of every message in `ids`, in the
    /// same order.
    fn fetch_structures(
        &mut self,
        ids: &MessageIdSet,
    ) -> impl Future<Output = std::result::Result<Vec<String>, Self::Error>> + Send;

    /// Fetches the full raw message.
    fn fetch_full_message(
        &mut self,
        id: &MessageId,
    ) -> impl Future<Output = std::result::Result<Vec<u8>, Self::Error>> + Send;
}

/// Indexes and extracts attachments through a [`MailSource`].
#[derive(Debug)]
pub struct AttachmentService<S> {
    source: S,
    builder: AttachmentIndexBuilder,
    resolver: PartResolver,
}

impl<S: MailSource> AttachmentService<S> {
    /// Creates a service; indexing and resolution share `config`.
    #[must_use]
    pub fn new(source: S, config: IndexConfig) -> Self {
        Self {
            source,
            builder: AttachmentIndexBuilder::new(config.clone()),
            resolver: PartResolver::new(config),
        }
    }

    /// Returns the underlying transport.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the underlying transport mutably.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consumes the service, returning the transport.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Lists the attachments of every message in `ids`.
    ///
    /// An empty set returns an empty index without touching the transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the fetch fails and
    /// [`Error::MalformedResponse`] if the number of structures returned
    /// differs from the number requested. Per-message parse failures are
    /// reported in [`AttachmentIndex::skipped`] instead.
    pub async fn build_attachment_index(&mut self, ids: &MessageIdSet) -> Result<AttachmentIndex> {
        if ids.is_empty() {
            debug!("No messages to index");
            return Ok(AttachmentIndex::default());
        }

        debug!(messages = ids.len(), token = %ids, "Fetching structures");
        let structures = self
            .source
            .fetch_structures(ids)
            .await
            .map_err(transport_error)?;

        if structures.len() != ids.len() {
            return Err(Error::MalformedResponse(format!(
                "requested {} structures, received {}",
                ids.len(),
                structures.len()
            )));
        }

        Ok(self.builder.build(ids.iter().cloned().zip(structures)))
    }

    /// Downloads the message `locator` points into and extracts the
    /// attachment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the download fails, otherwise the
    /// errors of [`PartResolver::resolve`].
    pub async fn extract_attachment(
        &mut self,
        locator: &AttachmentLocator,
    ) -> Result<AttachmentBytes> {
        debug!(message_id = %locator.message_id, ordinal = locator.ordinal, "Fetching message");
        let raw = self
            .source
            .fetch_full_message(&locator.message_id)
            .await
            .map_err(transport_error)?;

        self.resolver.resolve(&locator.message_id, &raw, locator)
    }
}

fn transport_error<E: std::error::Error + Send + Sync + 'static>(error: E) -> Error {
    Error::Transport(Box::new(error))
}
