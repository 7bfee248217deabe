//! The media normalization pipeline.
//!
//! `sniff → dispatch → resize → re-encode → optimize`. External conversions go
//! through the [`Transcoder`]; pixel work runs on the blocking pool. Both are
//! bounded by one semaphore.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use flate2::read::GzDecoder;
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info, instrument};

use super::diagnostics::{capture_failed_input, DiagnosticArtifact};
use super::error::NormalizeError;
use super::raster::{self, EncodedMedia, ANIMATED_MIMETYPE};
use super::resize::MAX_STICKER_SIZE;
use super::sniff::{extension_for, from_magic_bytes, sniff_mimetype, MediaCategory};
use crate::adapters::Transcoder;
use crate::config::ResolvedConfig;

/// Output of a successful normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMedia {
    pub data: Vec<u8>,
    pub mimetype: String,
    pub width: u32,
    pub height: u32,
}

impl NormalizedMedia {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn from_encoded(encoded: EncodedMedia) -> Self {
        Self {
            data: encoded.data,
            mimetype: encoded.mimetype.to_string(),
            width: encoded.width,
            height: encoded.height,
        }
    }
}

/// A normalization error together with where the failing input was saved
#[derive(Debug, Error)]
#[error("{source} ({diagnostic})")]
pub struct NormalizeFailure {
    pub source: NormalizeError,
    pub diagnostic: DiagnosticArtifact,
}

/// Converts arbitrary sticker sources into canonical still/animated images
pub struct Normalizer {
    transcoder: Arc<dyn Transcoder>,
    permits: Arc<Semaphore>,
    max_dimension: u32,
}

impl Normalizer {
    /// Create a normalizer allowing `max_concurrent` tool or pixel jobs at once
    pub fn new(transcoder: Arc<dyn Transcoder>, max_concurrent: usize) -> Self {
        Self {
            transcoder,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            max_dimension: MAX_STICKER_SIZE,
        }
    }

    /// Create from resolved configuration
    pub fn from_config(transcoder: Arc<dyn Transcoder>, config: &ResolvedConfig) -> Self {
        Self::new(transcoder, config.limits.max_concurrent_tools)
    }

    /// Override the bounding box (default 256)
    pub fn with_max_dimension(mut self, bound: u32) -> Self {
        self.max_dimension = bound.max(1);
        self
    }

    async fn permit(&self) -> Result<SemaphorePermit<'_>, NormalizeError> {
        self.permits
            .acquire()
            .await
            .map_err(|e| NormalizeError::Worker(e.to_string()))
    }

    /// Normalize, saving the original bytes to a temp file on failure
    pub async fn normalize_or_capture(
        &self,
        data: &[u8],
        filename: Option<&str>,
    ) -> Result<NormalizedMedia, NormalizeFailure> {
        match self.normalize(data, filename).await {
            Ok(media) => Ok(media),
            Err(source) => {
                let diagnostic = capture_failed_input(data, filename);
                Err(NormalizeFailure { source, diagnostic })
            }
        }
    }

    /// Normalize one input
    #[instrument(skip(self, data), fields(bytes = data.len(), transcoder = self.transcoder.name()))]
    pub async fn normalize(
        &self,
        data: &[u8],
        filename: Option<&str>,
    ) -> Result<NormalizedMedia, NormalizeError> {
        let mimetype = sniff_mimetype(data, filename)
            .ok_or_else(|| NormalizeError::unsupported("application/octet-stream"))?;
        debug!(mimetype, "Sniffed input");

        let (raster, raster_mimetype) = match MediaCategory::of(mimetype) {
            MediaCategory::Video => (self.video_to_gif(data, mimetype).await?, ANIMATED_MIMETYPE),
            MediaCategory::Gzip => (self.gzip_to_gif(data).await?, ANIMATED_MIMETYPE),
            MediaCategory::Raster => (data.to_vec(), mimetype),
            MediaCategory::Json | MediaCategory::Unsupported => {
                return Err(NormalizeError::unsupported(mimetype));
            }
        };

        let encoded = self.encode(raster, raster_mimetype).await?;
        let media = if encoded.is_animated() {
            self.optimize(encoded).await?
        } else {
            NormalizedMedia::from_encoded(encoded)
        };

        info!(
            mimetype = %media.mimetype,
            width = media.width,
            height = media.height,
            size = media.size(),
            "Normalized"
        );
        Ok(media)
    }

    async fn video_to_gif(&self, data: &[u8], mimetype: &str) -> Result<Vec<u8>, NormalizeError> {
        let work = tempfile::tempdir()?;
        let input = work.path().join(format!("input.{}", extension_for(mimetype)));
        let stable = work.path().join("stable.mkv");
        let output = work.path().join("animation.gif");
        tokio::fs::write(&input, data).await?;

        let _permit = self.permit().await?;
        let codec = self.transcoder.probe_codec(&input).await?;
        debug!(?codec, "Probed video codec");
        self.transcoder.remux(&input, &stable).await?;
        self.transcoder
            .video_to_animation(&stable, &output, &codec)
            .await?;

        read_output(&output).await
    }

    async fn gzip_to_gif(&self, data: &[u8]) -> Result<Vec<u8>, NormalizeError> {
        let payload = gunzip(data)?;
        let inner = from_magic_bytes(&payload);
        if inner.map(MediaCategory::of) != Some(MediaCategory::Json) {
            return Err(NormalizeError::unsupported(format!(
                "application/gzip ({})",
                inner.unwrap_or("unknown payload")
            )));
        }

        let work = tempfile::tempdir()?;
        let input = work.path().join("animation.json");
        let output = work.path().join("animation.gif");
        tokio::fs::write(&input, &payload).await?;

        let _permit = self.permit().await?;
        self.transcoder.lottie_to_animation(&input, &output).await?;
        read_output(&output).await
    }

    async fn encode(&self, data: Vec<u8>, mimetype: &str) -> Result<EncodedMedia, NormalizeError> {
        let _permit = self.permit().await?;
        let mimetype = mimetype.to_string();
        let bound = self.max_dimension;

        tokio::task::spawn_blocking(move || {
            let decoded = raster::decode(&data, &mimetype)?;
            raster::encode(decoded, bound)
        })
        .await
        .map_err(|e| NormalizeError::Worker(e.to_string()))?
    }

    async fn optimize(&self, encoded: EncodedMedia) -> Result<NormalizedMedia, NormalizeError> {
        let work = tempfile::tempdir()?;
        let input = work.path().join("encoded.gif");
        let output = work.path().join("optimized.gif");
        tokio::fs::write(&input, &encoded.data).await?;

        let _permit = self.permit().await?;
        self.transcoder.optimize_animation(&input, &output).await?;
        let data = read_output(&output).await?;
        debug!(before = encoded.data.len(), after = data.len(), "Optimized animation");

        Ok(NormalizedMedia {
            data,
            mimetype: encoded.mimetype.to_string(),
            width: encoded.width,
            height: encoded.height,
        })
    }
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>, NormalizeError> {
    let mut payload = Vec::new();
    GzDecoder::new(data).read_to_end(&mut payload)?;
    Ok(payload)
}

async fn read_output(path: &Path) -> Result<Vec<u8>, NormalizeError> {
    let data = tokio::fs::read(path).await?;
    if data.is_empty() {
        return Err(NormalizeError::malformed("tool output", "empty file"));
    }
    Ok(data)
}
