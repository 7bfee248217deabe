//! Sticker pack listings fetched from a remote provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Media kind of a provider sticker, used to name the downloaded file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerKind {
    #[default]
    Still,
    /// Gzipped Lottie
    Vector,
    Video,
}

impl StickerKind {
    pub fn extension(&self) -> &'static str {
        match self {
            StickerKind::Still => "webp",
            StickerKind::Vector => "tgs",
            StickerKind::Video => "webm",
        }
    }
}

/// One sticker in a provider pack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSticker {
    /// Stable provider id
    pub id: String,

    /// Provider alt text (usually a single emoji)
    #[serde(default)]
    pub alt: String,

    /// Opaque handle the provider needs to download the media
    pub file_ref: String,

    #[serde(default)]
    pub kind: StickerKind,
}

impl CatalogSticker {
    /// Filename for the downloaded media
    pub fn filename(&self) -> String {
        format!("{}.{}", self.id, self.kind.extension())
    }
}

/// Stickers associated with one emoticon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiGroup {
    pub emoticon: String,
    pub sticker_ids: Vec<String>,
}

/// A provider pack listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPack {
    pub id: String,
    pub short_name: String,
    pub title: String,

    /// Provider revision hash, when the provider exposes one
    #[serde(default)]
    pub hash: Option<String>,

    /// Stickers in pack order
    pub stickers: Vec<CatalogSticker>,

    #[serde(default)]
    pub emoji_groups: Vec<EmojiGroup>,
}

impl CatalogPack {
    /// Emoticons of every sticker, in group order. Empty and unknown-sticker
    /// entries are dropped.
    pub fn emoticons(&self) -> HashMap<&str, Vec<String>> {
        let mut by_sticker: HashMap<&str, Vec<String>> = HashMap::new();
        for group in self.emoji_groups.iter().filter(|g| !g.emoticon.is_empty()) {
            for id in &group.sticker_ids {
                if self.stickers.iter().any(|s| &s.id == id) {
                    by_sticker
                        .entry(id.as_str())
                        .or_default()
                        .push(group.emoticon.clone());
                }
            }
        }
        by_sticker
    }
}
