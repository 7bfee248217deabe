//! Shared fixtures and test doubles for integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use stickerpack::adapters::{ToolError, Transcoder, UploadError, Uploader, VideoCodec};
use stickerpack::media::Normalizer;

/// One recorded upload
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub mimetype: String,
    pub filename: String,
    pub size: usize,
}

/// Content store that hands out sequential URIs and records every call
#[derive(Default)]
pub struct CountingUploader {
    count: AtomicUsize,
    calls: Mutex<Vec<UploadCall>>,
}

impl CountingUploader {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for CountingUploader {
    async fn upload(&self, data: Vec<u8>, mimetype: &str, filename: &str) -> Result<String, UploadError> {
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().unwrap().push(UploadCall {
            mimetype: mimetype.to_string(),
            filename: filename.to_string(),
            size: data.len(),
        });
        Ok(format!("mxc://test.example/media{n}"))
    }
}

/// Transcoder that fabricates tool output in-process
pub struct FakeTranscoder {
    pub codec: VideoCodec,
    /// Size of the animation produced by the video and vector conversions
    pub animation_size: (u16, u16),
    /// When set, every tool call times out
    pub time_out: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTranscoder {
    pub fn new(codec: VideoCodec) -> Self {
        Self {
            codec,
            animation_size: (512, 128),
            time_out: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            time_out: true,
            ..Self::new(VideoCodec::Vp9)
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(call.clone());
        if self.time_out {
            return Err(ToolError::TimedOut {
                tool: call,
                timeout: Duration::from_secs(1),
            });
        }
        Ok(())
    }

    fn write_animation(&self, output: &Path) -> Result<(), ToolError> {
        let (w, h) = self.animation_size;
        std::fs::write(output, animated_gif(w, h, 2)).map_err(|source| ToolError::Spawn {
            tool: "fake".to_string(),
            source,
        })
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    fn name(&self) -> &str {
        "fake"
    }

    async fn probe_codec(&self, _input: &Path) -> Result<VideoCodec, ToolError> {
        self.record("probe".to_string())?;
        Ok(self.codec.clone())
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        self.record("remux".to_string())?;
        std::fs::copy(input, output)
            .map(|_| ())
            .map_err(|source| ToolError::Spawn {
                tool: "fake".to_string(),
                source,
            })
    }

    async fn video_to_animation(
        &self,
        _input: &Path,
        output: &Path,
        codec: &VideoCodec,
    ) -> Result<(), ToolError> {
        self.record(format!("video:{}", codec.decoder().unwrap_or("default")))?;
        self.write_animation(output)
    }

    async fn lottie_to_animation(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let json = std::fs::read_to_string(input).unwrap_or_default();
        self.record(format!("lottie:{}", json.len()))?;
        self.write_animation(output)
    }

    async fn optimize_animation(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        self.record("optimize".to_string())?;
        std::fs::copy(input, output)
            .map(|_| ())
            .map_err(|source| ToolError::Spawn {
                tool: "fake".to_string(),
                source,
            })
    }
}

pub fn normalizer(transcoder: Arc<FakeTranscoder>) -> Normalizer {
    Normalizer::new(transcoder, 2)
}

/// Solid-color PNG; `shade` makes the bytes (and thus the identity) unique
pub fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([shade, 128, 255 - shade, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

/// GIF with `frames` differently colored frames, looping forever
pub fn animated_gif(width: u16, height: u16, frames: u8) -> Vec<u8> {
    let mut encoder = gif::Encoder::new(Vec::new(), width, height, &[]).unwrap();
    encoder.set_repeat(gif::Repeat::Infinite).unwrap();
    for i in 0..frames {
        let color = [i.wrapping_mul(60), 200, 255 - i.wrapping_mul(60), 255];
        let mut pixels = RgbaImage::from_pixel(u32::from(width), u32::from(height), Rgba(color)).into_raw();
        let mut frame = gif::Frame::from_rgba_speed(width, height, &mut pixels, 30);
        frame.delay = 8;
        encoder.write_frame(&frame).unwrap();
    }
    encoder.into_inner().unwrap()
}

/// First bytes of a WebM file; enough for sniffing
pub fn webm_stub() -> Vec<u8> {
    vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01]
}

fn riff_chunk(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = fourcc.to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn u24(value: u32) -> [u8; 3] {
    let bytes = value.to_le_bytes();
    [bytes[0], bytes[1], bytes[2]]
}

/// Image bitstream chunks (`VP8L`/`VP8 `/`ALPH`) of a lossless still WebP
fn webp_bitstream(img: &RgbaImage) -> Vec<u8> {
    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut encoded, ImageFormat::WebP)
        .unwrap();
    let data = encoded.into_inner();

    let mut out = Vec::new();
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let size = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let end = (pos + 8 + size + (size & 1)).min(data.len());
        if matches!(&data[pos..pos + 4], b"VP8L" | b"VP8 " | b"ALPH") {
            out.extend_from_slice(&data[pos..end]);
        }
        pos = end;
    }
    out
}

/// Animated WebP (VP8X + ANIM + ANMF) whose frames do not blend and keep
/// their area on disposal
pub fn animated_webp(frames: &[(RgbaImage, u32)], loop_count: u16) -> Vec<u8> {
    let (width, height) = frames[0].0.dimensions();

    let mut vp8x = vec![0x12, 0, 0, 0];
    vp8x.extend_from_slice(&u24(width - 1));
    vp8x.extend_from_slice(&u24(height - 1));

    let mut anim = vec![0, 0, 0, 0];
    anim.extend_from_slice(&loop_count.to_le_bytes());

    let mut payload = riff_chunk(b"VP8X", &vp8x);
    payload.extend(riff_chunk(b"ANIM", &anim));
    for (img, duration_ms) in frames {
        let mut anmf = Vec::new();
        anmf.extend_from_slice(&u24(0));
        anmf.extend_from_slice(&u24(0));
        anmf.extend_from_slice(&u24(img.width() - 1));
        anmf.extend_from_slice(&u24(img.height() - 1));
        anmf.extend_from_slice(&u24(*duration_ms));
        // Do not blend, keep on dispose
        anmf.push(0x02);
        anmf.extend(webp_bitstream(img));
        payload.extend(riff_chunk(b"ANMF", &anmf));
    }

    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&((payload.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(b"WEBP");
    out.extend(payload);
    out
}
