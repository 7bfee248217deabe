//! In-process raster decode and re-encode.
//!
//! Everything here is synchronous and CPU-bound; the normalizer runs it on the
//! blocking pool.

use std::io::Cursor;

use image::codecs::gif::GifDecoder;
use image::codecs::webp::WebPDecoder;
use image::imageops::FilterType;
use image::{AnimationDecoder, DynamicImage, GenericImageView, ImageFormat, RgbaImage};

use super::alpha::clean_alpha;
use super::error::NormalizeError;
use super::frames::{read_gif_meta, read_webp_meta, AnimationMeta, LoopCount};
use super::resize::fit_within;

/// Canonical mimetype of a still sticker
pub const STILL_MIMETYPE: &str = "image/png";
/// Canonical mimetype of an animated sticker
pub const ANIMATED_MIMETYPE: &str = "image/gif";

/// gif quantizer speed (1 = best, 30 = fastest)
const QUANTIZE_SPEED: i32 = 10;

/// A decoded source image
#[derive(Debug)]
pub enum Decoded {
    Still(DynamicImage),
    Animated {
        /// Fully composited canvas for each frame
        frames: Vec<RgbaImage>,
        meta: AnimationMeta,
    },
}

impl Decoded {
    pub fn is_animated(&self) -> bool {
        matches!(self, Decoded::Animated { .. })
    }
}

/// Re-encoded output of [`encode`]
#[derive(Debug, Clone)]
pub struct EncodedMedia {
    pub data: Vec<u8>,
    pub mimetype: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedMedia {
    pub fn is_animated(&self) -> bool {
        self.mimetype == ANIMATED_MIMETYPE
    }
}

/// Decode raster bytes of the given (sniffed) mimetype
pub fn decode(data: &[u8], mimetype: &str) -> Result<Decoded, NormalizeError> {
    match mimetype {
        "image/webp" => decode_webp(data),
        "image/gif" => decode_gif(data),
        _ => Ok(Decoded::Still(image::load_from_memory(data)?)),
    }
}

fn decode_webp(data: &[u8]) -> Result<Decoded, NormalizeError> {
    let meta = read_webp_meta(data)?;
    if meta.frames.is_empty() {
        return Ok(Decoded::Still(image::load_from_memory_with_format(
            data,
            ImageFormat::WebP,
        )?));
    }

    let mut frames: Vec<RgbaImage> = WebPDecoder::new(Cursor::new(data))?
        .into_frames()
        .collect_frames()?
        .into_iter()
        .map(|frame| frame.into_buffer())
        .collect();

    if frames.is_empty() {
        return Err(NormalizeError::malformed("WebP", "no frames"));
    }
    if frames_identical(&frames) {
        let first = frames.swap_remove(0);
        return Ok(Decoded::Still(DynamicImage::ImageRgba8(first)));
    }

    Ok(Decoded::Animated { frames, meta })
}

fn decode_gif(data: &[u8]) -> Result<Decoded, NormalizeError> {
    let decoder = GifDecoder::new(Cursor::new(data))?;
    let mut frames: Vec<RgbaImage> = decoder
        .into_frames()
        .collect_frames()?
        .into_iter()
        .map(|frame| frame.into_buffer())
        .collect();

    match frames.len() {
        0 => Err(NormalizeError::malformed("GIF", "no frames")),
        1 => Ok(Decoded::Still(DynamicImage::ImageRgba8(frames.remove(0)))),
        _ => {
            let meta = read_gif_meta(data)?;
            Ok(Decoded::Animated { frames, meta })
        }
    }
}

/// True when every frame is pixel-identical to the first (or there is at most one)
pub fn frames_identical(frames: &[RgbaImage]) -> bool {
    match frames.split_first() {
        None => true,
        Some((first, rest)) => rest
            .iter()
            .all(|frame| frame.dimensions() == first.dimensions() && frame.as_raw() == first.as_raw()),
    }
}

/// Resize to fit `bound` and encode to the canonical format
pub fn encode(decoded: Decoded, bound: u32) -> Result<EncodedMedia, NormalizeError> {
    match decoded {
        Decoded::Still(img) => encode_still(img, bound),
        Decoded::Animated { frames, meta } => encode_animated(frames, &meta, bound),
    }
}

fn encode_still(img: DynamicImage, bound: u32) -> Result<EncodedMedia, NormalizeError> {
    let (width, height) = img.dimensions();
    let (target_w, target_h) = fit_within(width, height, bound);
    let img = if (target_w, target_h) != (width, height) {
        img.resize_exact(target_w, target_h, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;

    Ok(EncodedMedia {
        data: out.into_inner(),
        mimetype: STILL_MIMETYPE,
        width: target_w,
        height: target_h,
    })
}

fn gif_dimension(value: u32) -> Result<u16, NormalizeError> {
    u16::try_from(value)
        .map_err(|_| NormalizeError::malformed("GIF", format!("dimension {value} too large")))
}

/// Milliseconds to GIF centiseconds, rounded, at least 1
fn delay_centiseconds(ms: u32) -> u16 {
    let cs = (ms.saturating_add(5) / 10).max(1);
    u16::try_from(cs).unwrap_or(u16::MAX)
}

fn encode_animated(
    frames: Vec<RgbaImage>,
    meta: &AnimationMeta,
    bound: u32,
) -> Result<EncodedMedia, NormalizeError> {
    let (width, height) = frames
        .first()
        .map(|f| f.dimensions())
        .ok_or_else(|| NormalizeError::malformed("animation", "no frames"))?;
    let (target_w, target_h) = fit_within(width, height, bound);
    let resize = (target_w, target_h) != (width, height);
    let (gif_w, gif_h) = (gif_dimension(target_w)?, gif_dimension(target_h)?);

    let mut encoder = gif::Encoder::new(Vec::new(), gif_w, gif_h, &[])?;
    // A missing loop extension means "play once"; writing Finite(0) would loop forever
    match meta.loop_count {
        Some(LoopCount::Infinite) => encoder.set_repeat(gif::Repeat::Infinite)?,
        Some(LoopCount::Finite(n)) => encoder.set_repeat(gif::Repeat::Finite(n))?,
        None => {}
    }

    for (index, frame) in frames.into_iter().enumerate() {
        let mut frame = if resize {
            image::imageops::resize(&frame, target_w, target_h, FilterType::Lanczos3)
        } else {
            frame
        };
        clean_alpha(&mut frame);

        let frame_meta = meta.frame(index);
        let mut pixels = frame.into_raw();
        let mut out = gif::Frame::from_rgba_speed(gif_w, gif_h, &mut pixels, QUANTIZE_SPEED);
        out.delay = delay_centiseconds(frame_meta.delay_or_default());
        // Every frame is a full composited canvas, so it must not show through to the next
        out.dispose = gif::DisposalMethod::Background;
        encoder.write_frame(&out)?;
    }

    let data = encoder.into_inner()?;
    Ok(EncodedMedia {
        data,
        mimetype: ANIMATED_MIMETYPE,
        width: target_w,
        height: target_h,
    })
}
