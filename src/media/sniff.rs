//! Mimetype detection from magic bytes.
//!
//! Content is trusted over the filename: the extension is only consulted
//! when no signature matches.

use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
const FTYP: &[u8; 4] = b"ftyp";
const QUICKTIME_BRAND: &[u8; 4] = b"qt  ";

/// Broad dispatch category of a mimetype
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    /// Any `video/*`
    Video,
    /// Compressed vector animation archive
    Gzip,
    /// Decompressed vector animation
    Json,
    /// Any `image/*`
    Raster,
    Unsupported,
}

impl MediaCategory {
    /// Classify a sniffed mimetype
    pub fn of(mimetype: &str) -> Self {
        if mimetype.starts_with("video/") {
            MediaCategory::Video
        } else if mimetype == "application/gzip" {
            MediaCategory::Gzip
        } else if mimetype == "application/json" {
            MediaCategory::Json
        } else if mimetype.starts_with("image/") {
            MediaCategory::Raster
        } else {
            MediaCategory::Unsupported
        }
    }

    /// Whether a top-level source item of this category can be normalized
    pub fn is_source(&self) -> bool {
        matches!(
            self,
            MediaCategory::Video | MediaCategory::Gzip | MediaCategory::Raster
        )
    }
}

/// Detect the mimetype from content, falling back to the filename extension
pub fn sniff_mimetype(data: &[u8], filename: Option<&str>) -> Option<&'static str> {
    from_magic_bytes(data).or_else(|| filename.and_then(from_extension))
}

/// Detect the mimetype from content alone
pub fn from_magic_bytes(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&GZIP_MAGIC) {
        return Some("application/gzip");
    }

    if let Ok(format) = image::guess_format(data) {
        return Some(format.to_mime_type());
    }

    if data.starts_with(&EBML_MAGIC) {
        return Some("video/webm");
    }

    if data.len() >= 12 && &data[4..8] == FTYP {
        return if &data[8..12] == QUICKTIME_BRAND {
            Some("video/quicktime")
        } else {
            Some("video/mp4")
        };
    }

    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => Some("application/json"),
        _ => None,
    }
}

/// Guess the mimetype from a filename extension
pub fn from_extension(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();

    let mimetype = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp4" | "m4v" => "video/mp4",
        "webm" | "mkv" => "video/webm",
        "mov" => "video/quicktime",
        "tgs" | "gz" => "application/gzip",
        "json" => "application/json",
        _ => return None,
    };

    Some(mimetype)
}

/// File extension to use when a mimetype must be written to disk
pub fn extension_for(mimetype: &str) -> &'static str {
    match mimetype {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "application/gzip" => "tgs",
        "application/json" => "json",
        _ => "bin",
    }
}
