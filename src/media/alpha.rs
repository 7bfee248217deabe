//! Transparency cleanup for animated output.
//!
//! GIF only has 1-bit transparency. Thresholding alone leaves speckles and
//! saw-tooth edges, so the binarized mask is opened (3×3 erosion followed by
//! 3×3 dilation) before it is written back.

use image::RgbaImage;

/// Alpha values below this become fully transparent
pub const ALPHA_CUTOFF: u8 = 128;

/// Binarize and open the alpha channel in place
pub fn clean_alpha(img: &mut RgbaImage) {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    let mask = binarize(img);
    let opened = dilate(&erode(&mask, width, height), width, height);

    for (pixel, opaque) in img.pixels_mut().zip(opened) {
        pixel.0[3] = if opaque { u8::MAX } else { 0 };
    }
}

/// Opaque mask: `true` where alpha >= cutoff
fn binarize(img: &RgbaImage) -> Vec<bool> {
    img.pixels().map(|p| p.0[3] >= ALPHA_CUTOFF).collect()
}

/// 3×3 neighbourhood fold with edge pixels replicated
fn morph(mask: &[bool], width: u32, height: u32, erode: bool) -> Vec<bool> {
    let (w, h) = (width as i64, height as i64);
    let at = |x: i64, y: i64| -> bool {
        let x = x.clamp(0, w - 1);
        let y = y.clamp(0, h - 1);
        mask[(y * w + x) as usize]
    };

    let mut out = Vec::with_capacity(mask.len());
    for y in 0..h {
        for x in 0..w {
            let mut neighbours = (-1..=1).flat_map(|dy| (-1..=1).map(move |dx| (dx, dy)));
            let value = if erode {
                neighbours.all(|(dx, dy)| at(x + dx, y + dy))
            } else {
                neighbours.any(|(dx, dy)| at(x + dx, y + dy))
            };
            out.push(value);
        }
    }
    out
}

fn erode(mask: &[bool], width: u32, height: u32) -> Vec<bool> {
    morph(mask, width, height, true)
}

fn dilate(mask: &[bool], width: u32, height: u32) -> Vec<bool> {
    morph(mask, width, height, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn alpha_at(img: &RgbaImage, x: u32, y: u32) -> u8 {
        img.get_pixel(x, y).0[3]
    }

    #[test]
    fn test_alpha_is_binary_after_cleaning() {
        let mut img = RgbaImage::from_fn(8, 8, |x, y| Rgba([10, 20, 30, ((x * 8 + y) * 4) as u8]));
        clean_alpha(&mut img);
        assert!(img.pixels().all(|p| p.0[3] == 0 || p.0[3] == 255));
    }

    #[test]
    fn test_isolated_speck_removed() {
        let mut img = RgbaImage::from_pixel(9, 9, Rgba([0, 0, 0, 0]));
        img.put_pixel(4, 4, Rgba([255, 0, 0, 255]));

        clean_alpha(&mut img);
        assert_eq!(alpha_at(&img, 4, 4), 0);
    }

    #[test]
    fn test_solid_block_survives() {
        let mut img = RgbaImage::from_pixel(12, 12, Rgba([0, 0, 0, 0]));
        for y in 3..9 {
            for x in 3..9 {
                img.put_pixel(x, y, Rgba([0, 255, 0, 200]));
            }
        }

        clean_alpha(&mut img);
        for y in 3..9 {
            for x in 3..9 {
                assert_eq!(alpha_at(&img, x, y), 255, "pixel ({x},{y})");
            }
        }
        assert_eq!(alpha_at(&img, 1, 1), 0);
        assert_eq!(alpha_at(&img, 10, 10), 0);
    }

    #[test]
    fn test_faint_pixels_become_transparent() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([0, 0, 0, ALPHA_CUTOFF - 1]));
        clean_alpha(&mut img);
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn test_fully_opaque_image_unchanged_at_edges() {
        // Edge replication keeps border pixels of an opaque frame opaque
        let mut img = RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255]));
        clean_alpha(&mut img);
        assert!(img.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_jagged_spur_is_smoothed() {
        // A one-pixel-wide spur sticking out of a solid block is removed
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 0]));
        for y in 2..8 {
            for x in 2..6 {
                img.put_pixel(x, y, Rgba([9, 9, 9, 255]));
            }
        }
        img.put_pixel(6, 4, Rgba([9, 9, 9, 255]));
        img.put_pixel(7, 4, Rgba([9, 9, 9, 255]));

        clean_alpha(&mut img);
        assert_eq!(alpha_at(&img, 7, 4), 0);
        assert_eq!(alpha_at(&img, 6, 4), 0);
        assert_eq!(alpha_at(&img, 3, 4), 255);
    }
}
