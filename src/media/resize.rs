//! Aspect-preserving downscale math.

/// Largest width or height a sticker may have
pub const MAX_STICKER_SIZE: u32 = 256;

/// Compute output dimensions bounded by `bound`.
///
/// Dimensions already within the bound are returned unchanged. Otherwise the
/// larger side becomes `bound` and the other side is `floor(other * bound /
/// larger)`, clamped to at least 1 pixel. Square inputs become `bound × bound`.
pub fn fit_within(width: u32, height: u32, bound: u32) -> (u32, u32) {
    if width <= bound && height <= bound {
        return (width, height);
    }

    let scale = |other: u32, larger: u32| -> u32 {
        let scaled = u64::from(other) * u64::from(bound) / u64::from(larger);
        (scaled as u32).max(1)
    };

    if width >= height {
        (bound, scale(height, width))
    } else {
        (scale(width, height), bound)
    }
}

/// Whether resampling is needed at all
pub fn needs_resize(width: u32, height: u32, bound: u32) -> bool {
    fit_within(width, height, bound) != (width, height)
}
