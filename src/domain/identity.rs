//! Stable dedup keys for source items.
//!
//! Local files are keyed by the SHA-256 of their original bytes, remote
//! catalog items by the provider's own item id.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Sticker identity (`sha256:<hex>` or `<provider>-<id>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Hash the unmodified source bytes.
    ///
    /// Must be called before any transcoding so that a rename keeps the
    /// identity and any byte-level change produces a new one.
    pub fn from_content(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    /// Qualify a provider-native item id, e.g. `tg-1234`
    pub fn from_provider(provider: &str, item_id: impl std::fmt::Display) -> Self {
        Self(format!("{}-{}", provider, item_id))
    }

    /// Wrap an identity read back from a manifest
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this identity was derived from content
    pub fn is_content_hash(&self) -> bool {
        self.0.starts_with("sha256:")
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
