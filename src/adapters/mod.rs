//! Adapter interfaces for external systems.
//!
//! Three seams leave the core: the [`Transcoder`] capability (external video,
//! vector-animation and optimizer tools), the [`Uploader`] collaborator (the
//! content store) and the [`StickerCatalog`] of a remote provider.

pub mod external;
pub mod matrix;
pub mod telegram;
pub mod tools;

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{CatalogPack, CatalogSticker};

pub use external::ExternalTranscoder;
pub use matrix::{MatrixUploader, UploadError};
pub use telegram::{CatalogError, TelegramCatalog};
pub use tools::{ToolCommand, ToolError, ToolOutput};

/// Codec family of a video's first stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoCodec {
    Vp9,
    Vp8,
    Other(String),
}

impl VideoCodec {
    /// Parse an ffprobe `codec_name`
    pub fn from_codec_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "vp9" => VideoCodec::Vp9,
            "vp8" => VideoCodec::Vp8,
            other => VideoCodec::Other(other.to_string()),
        }
    }

    /// Decoder to force so that alpha channels survive decoding
    pub fn decoder(&self) -> Option<&'static str> {
        match self {
            VideoCodec::Vp9 => Some("libvpx-vp9"),
            VideoCodec::Vp8 => Some("libvpx"),
            VideoCodec::Other(_) => None,
        }
    }
}

/// External transcoding capability.
///
/// All operations take input/output file paths; implementations own their
/// own timeouts.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Detect the codec of the first video stream
    async fn probe_codec(&self, input: &Path) -> Result<VideoCodec, ToolError>;

    /// Copy-codec pass into a stable container
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError>;

    /// Transcode a video into an animated GIF
    async fn video_to_animation(
        &self,
        input: &Path,
        output: &Path,
        codec: &VideoCodec,
    ) -> Result<(), ToolError>;

    /// Render a vector (Lottie JSON) animation into an animated GIF
    async fn lottie_to_animation(&self, input: &Path, output: &Path) -> Result<(), ToolError>;

    /// Palette/size optimization of an animated GIF
    async fn optimize_animation(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Content store collaborator
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload bytes, returning the content URI
    async fn upload(&self, data: Vec<u8>, mimetype: &str, filename: &str) -> Result<String, UploadError>;
}

/// Remote provider of ready-made sticker packs
#[async_trait]
pub trait StickerCatalog: Send + Sync {
    /// Prefix of provider identities (`tg` gives `tg-<id>`)
    fn provider(&self) -> &str;

    /// Fetch a pack listing by short name
    async fn fetch_pack(&self, short_name: &str) -> Result<CatalogPack, CatalogError>;

    /// Download the original media of one sticker
    async fn download(&self, sticker: &CatalogSticker) -> Result<Vec<u8>, CatalogError>;
}
