//! Transcoder backed by external binaries.
//!
//! - `ffprobe` / `ffmpeg` for codec detection, remuxing and video → GIF
//! - `lottie_convert.py` (python-lottie) for vector animation → GIF
//! - `gifsicle` for palette/size optimization

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::tools::{ToolCommand, ToolError, DEFAULT_TOOL_TIMEOUT};
use super::{Transcoder, VideoCodec};
use crate::config::{ResolvedConfig, ToolPaths};

/// Palette pipeline that keeps a transparent slot and binarizes alpha
const GIF_FILTER: &str =
    "[0:v]split[a][b];[a]palettegen=reserve_transparent=1[p];[b][p]paletteuse=alpha_threshold=128";

/// Subprocess transcoder
pub struct ExternalTranscoder {
    tools: ToolPaths,
    timeout: Duration,
}

impl Default for ExternalTranscoder {
    fn default() -> Self {
        Self::new(ToolPaths::default(), DEFAULT_TOOL_TIMEOUT)
    }
}

impl ExternalTranscoder {
    /// Create a transcoder with explicit binaries and timeout
    pub fn new(tools: ToolPaths, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    /// Create from resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::new(config.tools.clone(), config.limits.tool_timeout())
    }

    fn ffmpeg(&self) -> ToolCommand {
        ToolCommand::new(&self.tools.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .timeout(self.timeout)
    }
}

#[async_trait]
impl Transcoder for ExternalTranscoder {
    fn name(&self) -> &str {
        "external"
    }

    async fn probe_codec(&self, input: &Path) -> Result<VideoCodec, ToolError> {
        let output = ToolCommand::new(&self.tools.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=codec_name",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .path(input)
            .timeout(self.timeout)
            .execute()
            .await?;

        Ok(VideoCodec::from_codec_name(output.stdout.lines().next().unwrap_or("")))
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        self.ffmpeg()
            .arg("-i")
            .path(input)
            .args(["-map", "0:v:0", "-c", "copy"])
            .path(output)
            .execute()
            .await?;
        Ok(())
    }

    async fn video_to_animation(
        &self,
        input: &Path,
        output: &Path,
        codec: &VideoCodec,
    ) -> Result<(), ToolError> {
        let mut cmd = self.ffmpeg();
        if let Some(decoder) = codec.decoder() {
            cmd = cmd.args(["-c:v", decoder]);
        }
        cmd.arg("-i")
            .path(input)
            .args(["-filter_complex", GIF_FILTER, "-f", "gif"])
            .path(output)
            .execute()
            .await?;
        Ok(())
    }

    async fn lottie_to_animation(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        ToolCommand::new(&self.tools.lottie_convert)
            .path(input)
            .path(output)
            .timeout(self.timeout)
            .execute()
            .await?;
        Ok(())
    }

    async fn optimize_animation(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        ToolCommand::new(&self.tools.gifsicle)
            .args(["-O3", "--colors", "256", "-o"])
            .path(output)
            .path(input)
            .timeout(self.timeout)
            .execute()
            .await?;
        Ok(())
    }
}
