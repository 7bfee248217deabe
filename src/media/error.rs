//! Errors raised while normalizing media.

use thiserror::Error;

use crate::adapters::ToolError;

/// A normalization failure for a single item
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Unsupported media type: {mimetype}")]
    UnsupportedMedia { mimetype: String },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Failed to decode GIF: {0}")]
    GifDecode(#[from] gif::DecodingError),

    #[error("Failed to encode GIF: {0}")]
    GifEncode(#[from] gif::EncodingError),

    #[error("Malformed {format} data: {reason}")]
    Malformed {
        format: &'static str,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media worker failed: {0}")]
    Worker(String),
}

impl NormalizeError {
    pub(crate) fn unsupported(mimetype: impl Into<String>) -> Self {
        Self::UnsupportedMedia {
            mimetype: mimetype.into(),
        }
    }

    pub(crate) fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            reason: reason.into(),
        }
    }
}
