/// Chroma keying against a single background color.
///
/// Masked pixels become `(255, 255, 255, 0)`: white with zero alpha, so tools
/// that drop the alpha channel see a neutral color instead of the old backdrop.
use image::{Rgba, RgbaImage};

use crate::detect::Rgb;

pub const TRANSPARENT: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// True when every RGB channel is within `tolerance` of `background`.
#[inline]
pub fn matches_background(pixel: &Rgba<u8>, background: Rgb, tolerance: u8) -> bool {
    pixel.0[..3]
        .iter()
        .zip(background.iter())
        .all(|(&c, &b)| c.abs_diff(b) <= tolerance)
}

/// Replace every background-matching pixel with [`TRANSPARENT`].
/// Other pixels, existing alpha included, pass through.
pub fn mask_background(img: &RgbaImage, background: Rgb, tolerance: u8) -> RgbaImage {
    let mut masked = 0usize;
    let out = RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let pixel = img.get_pixel(x, y);
        if matches_background(pixel, background, tolerance) {
            masked += 1;
            TRANSPARENT
        } else {
            *pixel
        }
    });
    log::debug!(
        "masked {} of {} pixels",
        masked,
        img.width() as u64 * img.height() as u64
    );
    out
}
