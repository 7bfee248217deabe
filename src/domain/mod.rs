//! Domain types for the sticker pack builder.
//!
//! This module contains the core data structures:
//! - Identity: Stable dedup keys
//! - StickerRecord / MediaInfo: Manifest entries
//! - Manifest: An ordered pack
//! - SourceItem: Raw media awaiting a build
//! - CatalogPack: A remote provider's pack listing

pub mod catalog;
pub mod identity;
pub mod manifest;
pub mod source;
pub mod sticker;

// Re-export commonly used types
pub use catalog::{CatalogPack, CatalogSticker, EmojiGroup, StickerKind};
pub use identity::Identity;
pub use manifest::Manifest;
pub use source::{Hints, Origin, SourceItem};
pub use sticker::{Annotations, MediaInfo, StickerRecord, ThumbnailInfo, STICKER_MSGTYPE};
