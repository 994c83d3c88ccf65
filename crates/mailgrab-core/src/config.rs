//! Indexing configuration.
//!
//! The same [`IndexConfig`] drives both the index builder and the part
//! resolver, so both sides agree on which parts count as attachments.

use mailgrab_mime::Disposition;
use serde::{Deserialize, Serialize};

/// Default prefix for attachments that carry no filename.
pub const DEFAULT_FALLBACK_PREFIX: &str = "attachment";

/// Rule deciding which leaf parts are attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentPolicy {
    /// Only parts with `Content-Disposition: attachment`.
    #[default]
    Disposition,
    /// Disposition `attachment`, or any part carrying a filename or name.
    DispositionOrFilename,
}

impl AttachmentPolicy {
    /// Returns true if a leaf with this disposition qualifies.
    #[must_use]
    pub const fn qualifies(self, disposition: Disposition, has_filename: bool) -> bool {
        match self {
            Self::Disposition => disposition.is_attachment(),
            Self::DispositionOrFilename => disposition.is_attachment() || has_filename,
        }
    }
}

/// Attachment indexing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Which leaf parts count as attachments.
    pub policy: AttachmentPolicy,
    /// Prefix of the generated name for attachments without a filename.
    pub fallback_prefix: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            policy: AttachmentPolicy::default(),
            fallback_prefix: DEFAULT_FALLBACK_PREFIX.to_string(),
        }
    }
}

impl IndexConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::new()
    }

    /// Name given to the attachment at `ordinal` when it has no filename.
    #[must_use]
    pub fn fallback_name(&self, ordinal: usize) -> String {
        format!("{}-{ordinal}", self.fallback_prefix)
    }
}

/// Builder for [`IndexConfig`].
#[derive(Debug, Clone)]
pub struct IndexConfigBuilder {
    policy: AttachmentPolicy,
    fallback_prefix: String,
}

impl Default for IndexConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexConfigBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            policy: AttachmentPolicy::default(),
            fallback_prefix: DEFAULT_FALLBACK_PREFIX.to_string(),
        }
    }

    /// Sets the attachment policy.
    #[must_use]
    pub const fn policy(mut self, policy: AttachmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the fallback name prefix.
    #[must_use]
    pub fn fallback_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fallback_prefix = prefix.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> IndexConfig {
        IndexConfig {
            policy: self.policy,
            fallback_prefix: self.fallback_prefix,
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

    #[test]
    fn test_default_config() {
        let config = IndexConfig::new();
        assert_eq!(config.policy, AttachmentPolicy::Disposition);
        assert_eq!(config.fallback_name(2), "attachment-2");
    }

    #[test]
    fn test_config_builder() {
        let config = IndexConfig::builder()
            .policy(AttachmentPolicy::DispositionOrFilename)
            .fallback_prefix("part")
            .build();

        assert_eq!(config.policy, AttachmentPolicy::DispositionOrFilename);
        assert_eq!(config.fallback_name(0), "part-0");
    }

    #[test]
    fn test_policy_qualifies() {
        let strict = AttachmentPolicy::Disposition;
        assert!(strict.qualifies(Disposition::Attachment, false));
        assert!(!strict.qualifies(Disposition::Inline, true));
        assert!(!strict.qualifies(Disposition::None, true));

        let loose = AttachmentPolicy::DispositionOrFilename;
        assert!(loose.qualifies(Disposition::Inline, true));
        assert!(loose.qualifies(Disposition::None, true));
        assert!(!loose.qualifies(Disposition::None, false));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: IndexConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, IndexConfig::default());

        let config: IndexConfig =
            serde_json::from_str(r#"{"policy": "disposition_or_filename"}"#).unwrap();
        assert_eq!(config.policy, AttachmentPolicy::DispositionOrFilename);
        assert_eq!(config.fallback_prefix, DEFAULT_FALLBACK_PREFIX);
    }
}
