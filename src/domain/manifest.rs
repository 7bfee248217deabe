//! Pack manifest (`pack.json` / `<pack id>.json`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::sticker::StickerRecord;

/// An ordered, published sticker pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub title: String,

    pub id: String,

    /// Insertion order is the rendered sticker order
    #[serde(default)]
    pub stickers: Vec<StickerRecord>,

    /// Pack-level extension metadata (e.g. `net.maunium.telegram.pack`)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new(title: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            stickers: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Filename the manifest is published under in a picker directory
    pub fn published_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Get the number of stickers
    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    /// Check if the pack has no stickers
    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }
}
