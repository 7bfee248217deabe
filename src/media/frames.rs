//! Animation timing and disposal metadata.
//!
//! Pixel data is decoded through `image` (which composites every frame onto
//! the full canvas); this module recovers what that decoder does not expose:
//! per-frame disposal and the loop count. GIF metadata comes from the `gif`
//! decoder, WebP metadata from walking the RIFF chunks (`ANIM` / `ANMF`).

use super::error::NormalizeError;

/// Frame duration used when the source does not specify one
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// How many times an animation plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Finite(u16),
}

/// What happens to a frame's area before the next frame is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposal {
    Keep,
    Background,
    Previous,
}

/// Timing and disposal of a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameMeta {
    pub delay_ms: Option<u32>,
    pub disposal: Option<Disposal>,
}

impl FrameMeta {
    /// Delay with the default applied
    pub fn delay_or_default(&self) -> u32 {
        self.delay_ms.unwrap_or(DEFAULT_FRAME_DELAY_MS)
    }

    /// Disposal with the default (restore background) applied
    pub fn disposal_or_default(&self) -> Disposal {
        self.disposal.unwrap_or(Disposal::Background)
    }
}

/// Container-level animation metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimationMeta {
    /// `None` when the source has no loop extension (play once)
    pub loop_count: Option<LoopCount>,
    pub frames: Vec<FrameMeta>,
}

impl AnimationMeta {
    /// Metadata for frame `index`, defaults when the container had fewer entries
    pub fn frame(&self, index: usize) -> FrameMeta {
        self.frames.get(index).copied().unwrap_or_default()
    }
}

/// Read loop count, delays and disposal from a GIF
pub fn read_gif_meta(data: &[u8]) -> Result<AnimationMeta, NormalizeError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(data)?;

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        let disposal = match frame.dispose {
            gif::DisposalMethod::Keep => Some(Disposal::Keep),
            gif::DisposalMethod::Background => Some(Disposal::Background),
            gif::DisposalMethod::Previous => Some(Disposal::Previous),
            gif::DisposalMethod::Any => None,
        };
        frames.push(FrameMeta {
            // GIF delays are in centiseconds; 0 means unspecified
            delay_ms: (frame.delay > 0).then(|| u32::from(frame.delay) * 10),
            disposal,
        });
    }

    let loop_count = match decoder.repeat() {
        gif::Repeat::Infinite => Some(LoopCount::Infinite),
        gif::Repeat::Finite(0) => None,
        gif::Repeat::Finite(n) => Some(LoopCount::Finite(n)),
    };

    Ok(AnimationMeta { loop_count, frames })
}

fn read_u24(bytes: &[u8]) -> u32 {
    u32::from(bytes[0]) | u32::from(bytes[1]) << 8 | u32::from(bytes[2]) << 16
}

/// Read loop count, durations and disposal from a WebP container
pub fn read_webp_meta(data: &[u8]) -> Result<AnimationMeta, NormalizeError> {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WEBP" {
        return Err(NormalizeError::malformed("WebP", "missing RIFF/WEBP header"));
    }

    // Bytes after the RIFF payload are not part of the container
    let riff_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    let end = riff_size.saturating_add(8).min(data.len());

    let mut meta = AnimationMeta::default();
    let mut pos = 12;

    while pos + 8 <= end {
        let fourcc = &data[pos..pos + 4];
        let size = u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]]) as usize;
        let body_start = pos + 8;
        let body_end = body_start
            .checked_add(size)
            .filter(|body_end| *body_end <= end)
            .ok_or_else(|| {
                NormalizeError::malformed(
                    "WebP",
                    format!("chunk {} overruns the file", String::from_utf8_lossy(fourcc)),
                )
            })?;
        let body = &data[body_start..body_end];

        match fourcc {
            b"ANIM" if body.len() >= 6 => {
                let loops = u16::from_le_bytes([body[4], body[5]]);
                meta.loop_count = Some(if loops == 0 {
                    LoopCount::Infinite
                } else {
                    LoopCount::Finite(loops)
                });
            }
            b"ANMF" if body.len() >= 16 => {
                let duration = read_u24(&body[12..15]);
                let flags = body[15];
                meta.frames.push(FrameMeta {
                    delay_ms: (duration > 0).then_some(duration),
                    disposal: Some(if flags & 0x01 != 0 {
                        Disposal::Background
                    } else {
                        Disposal::Keep
                    }),
                });
            }
            _ => {}
        }

        // Chunks are padded to even sizes
        pos = body_end + (size & 1);
    }

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn chunk(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = fourcc.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn anmf(duration_ms: u32, flags: u8) -> Vec<u8> {
        let mut body = vec![0u8; 12];
        body.extend_from_slice(&duration_ms.to_le_bytes()[..3]);
        body.push(flags);
        // Frame payload is irrelevant for metadata
        body.extend_from_slice(b"VP8L");
        chunk(b"ANMF", &body)
    }

    fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
        let payload: Vec<u8> = chunks.concat();
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&((payload.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(b"WEBP");
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn test_webp_animation_meta() {
        let data = riff(&[
            chunk(b"VP8X", &[0x12, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            chunk(b"ANIM", &[0, 0, 0, 0, 3, 0]),
            anmf(40, 0x01),
            anmf(0, 0x00),
        ]);

        let meta = read_webp_meta(&data).unwrap();
        assert_eq!(meta.loop_count, Some(LoopCount::Finite(3)));
        assert_eq!(meta.frames.len(), 2);
        assert_eq!(meta.frames[0].delay_ms, Some(40));
        assert_eq!(meta.frames[0].disposal, Some(Disposal::Background));
        assert_eq!(meta.frames[1].delay_or_default(), DEFAULT_FRAME_DELAY_MS);
        assert_eq!(meta.frames[1].disposal, Some(Disposal::Keep));
    }

    #[test]
    fn test_webp_zero_loops_is_infinite() {
        let data = riff(&[chunk(b"ANIM", &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0])]);
        let meta = read_webp_meta(&data).unwrap();
        assert_eq!(meta.loop_count, Some(LoopCount::Infinite));
        assert!(meta.frames.is_empty());
    }

    #[test]
    fn test_webp_truncated_chunk_is_malformed() {
        let mut data = riff(&[chunk(b"ANIM", &[0, 0, 0, 0, 0, 0])]);
        data.truncate(data.len() - 2);
        assert!(matches!(
            read_webp_meta(&data),
            Err(NormalizeError::Malformed { format: "WebP", .. })
        ));
        assert!(read_webp_meta(b"not a webp").is_err());
    }

    #[test]
    fn test_webp_trailing_bytes_ignored() {
        let mut data = riff(&[chunk(b"ANIM", &[0, 0, 0, 0, 2, 0]), anmf(30, 0x00)]);
        data.extend_from_slice(b"\x01\x02\x03trailing garbage after the container");

        let meta = read_webp_meta(&data).unwrap();
        assert_eq!(meta.loop_count, Some(LoopCount::Finite(2)));
        assert_eq!(meta.frames.len(), 1);
        assert_eq!(meta.frames[0].delay_ms, Some(30));
    }

    #[test]
    fn test_missing_frame_meta_uses_defaults() {
        let meta = AnimationMeta::default();
        let frame = meta.frame(5);
        assert_eq!(frame.delay_or_default(), 100);
        assert_eq!(frame.disposal_or_default(), Disposal::Background);
    }

    #[test]
    fn test_gif_meta() {
        let mut data = Vec::new();
        {
            let palette = [0u8, 0, 0, 255, 255, 255];
            let mut encoder = gif::Encoder::new(&mut data, 2, 2, &palette).unwrap();
            encoder.set_repeat(gif::Repeat::Finite(2)).unwrap();

            let mut first = gif::Frame::default();
            first.width = 2;
            first.height = 2;
            first.delay = 7;
            first.dispose = gif::DisposalMethod::Previous;
            first.buffer = Cow::Borrowed(&[0, 1, 1, 0]);
            encoder.write_frame(&first).unwrap();

            let mut second = gif::Frame::default();
            second.width = 2;
            second.height = 2;
            second.buffer = Cow::Borrowed(&[1, 0, 0, 1]);
            encoder.write_frame(&second).unwrap();
        }

        let meta = read_gif_meta(&data).unwrap();
        assert_eq!(meta.loop_count, Some(LoopCount::Finite(2)));
        assert_eq!(meta.frames.len(), 2);
        assert_eq!(meta.frames[0].delay_ms, Some(70));
        assert_eq!(meta.frames[0].disposal, Some(Disposal::Previous));
        assert_eq!(meta.frames[1].delay_ms, None);
    }
}
