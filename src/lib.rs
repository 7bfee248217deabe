//! stickerpack - Incremental, content-addressed sticker pack builder
//!
//! Turns a directory of heterogeneous media (stills, animated WebP/GIF,
//! WebM/MP4 clips, gzipped Lottie animations) into a published sticker pack
//! manifest, uploading only what is new.
//!
//! # Architecture
//!
//! Each build is one ordered pass over the source items:
//! - Every item gets an identity (SHA-256 of its original bytes, or a
//!   provider id for remote catalog items)
//! - Items already in the previous manifest reuse their upload; only the
//!   label and annotations are refreshed
//! - New items are normalized (sniff, transcode, resize, re-encode,
//!   optimize) and uploaded
//! - The manifest is written once, atomically, at the end
//!
//! # Modules
//!
//! - `adapters`: External tools (`Transcoder`), the content store (`Uploader`)
//!   and remote sticker catalogs (`StickerCatalog`)
//! - `core`: Manifest cache, builder and index updater
//! - `domain`: Identity, sticker records, manifests, source items
//! - `ingest`: Directory enumeration, provider and Scalar import
//! - `media`: The normalization pipeline
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Build or rebuild a pack
//! stickerpack build stickers/cats --add-to-index web/packs
//!
//! # Reupload a Telegram sticker pack
//! stickerpack import https://t.me/addstickers/Cats
//!
//! # Import an integration-manager dump
//! stickerpack import-scalar scalar-assets.json
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod media;

// Re-export main types at crate root for convenience
pub use adapters::{
    ExternalTranscoder, MatrixUploader, StickerCatalog, TelegramCatalog, Transcoder, UploadError,
    Uploader,
};
pub use config::{load_config, ResolvedConfig};
pub use crate::core::{BuildError, BuildReport, PackBuilder, PackDefaults, PackIndex};
pub use domain::{Identity, Manifest, MediaInfo, SourceItem, StickerRecord};
pub use ingest::DirectorySource;
pub use media::{NormalizeError, NormalizedMedia, Normalizer};
