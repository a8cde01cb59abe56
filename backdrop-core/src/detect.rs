/// Background color detection.
///
/// The default detector takes the population mode of the RGB values (alpha is
/// ignored). It holds for flat backdrops and misfires when a foreground color
/// covers more pixels than the backdrop does.
use std::collections::HashMap;

use image::RgbaImage;

use crate::error::{Error, Result};

/// An RGB triple without alpha.
pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];

/// How the background color of an image is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Detector {
    /// Most frequent RGB color. Ties go to the lowest RGB tuple.
    #[default]
    Dominant,
    /// Black/white vote over pixels within `tolerance` of either extreme.
    Extremes,
}

impl Detector {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dominant" => Some(Detector::Dominant),
            "extremes" => Some(Detector::Extremes),
            _ => None,
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["dominant", "extremes"]
    }

    pub fn detect(self, img: &RgbaImage, tolerance: u8) -> Result<Rgb> {
        match self {
            Detector::Dominant => detect_background(img),
            Detector::Extremes => detect_extremes(img, tolerance),
        }
    }
}

/// Count how many pixels carry each RGB color.
pub fn color_histogram(img: &RgbaImage) -> HashMap<Rgb, u32> {
    let mut counts: HashMap<Rgb, u32> = HashMap::new();
    for pixel in img.pixels() {
        *counts.entry([pixel[0], pixel[1], pixel[2]]).or_insert(0) += 1;
    }
    counts
}

/// Return the most frequent RGB color of the image.
///
/// Among colors sharing the maximum count the lowest tuple wins, compared
/// red first, then green, then blue.
pub fn detect_background(img: &RgbaImage) -> Result<Rgb> {
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::EmptyImage);
    }

    let counts = color_histogram(img);
    let background = counts
        .into_iter()
        .max_by(|(color_a, count_a), (color_b, count_b)| {
            count_a.cmp(count_b).then_with(|| color_b.cmp(color_a))
        })
        .map(|(color, _)| color)
        .ok_or(Error::EmptyImage)?;

    log::debug!("dominant background color: {}", to_hex(background));
    Ok(background)
}

/// Decide between a black and a white backdrop.
///
/// A pixel votes black when every channel is below `tolerance`, otherwise
/// white when every channel is above `255 - tolerance`. Black wins only with
/// strictly more votes, so `tolerance = 0` always yields white.
pub fn detect_extremes(img: &RgbaImage, tolerance: u8) -> Result<Rgb> {
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::EmptyImage);
    }

    let high = 255 - tolerance;
    let mut black = 0u64;
    let mut white = 0u64;
    for pixel in img.pixels() {
        let rgb = &pixel.0[..3];
        if rgb.iter().all(|&c| c < tolerance) {
            black += 1;
        } else if rgb.iter().all(|&c| c > high) {
            white += 1;
        }
    }

    log::debug!("extremes vote: {} black, {} white", black, white);
    Ok(if black > white { BLACK } else { WHITE })
}

/// Fraction of pixels whose RGB equals `color` exactly.
pub fn color_share(img: &RgbaImage, color: Rgb) -> f64 {
    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let hits = img
        .pixels()
        .filter(|p| p[0] == color[0] && p[1] == color[1] && p[2] == color[2])
        .count();
    hits as f64 / total as f64
}

/// Parse a hex color string like "#FF20AB" or "FF20AB" into [r, g, b].
pub fn parse_hex(s: &str) -> Result<Rgb> {
    let digits = s.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(Error::InvalidColor(s.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidColor(s.to_string()))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

pub fn to_hex(color: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_uniform_image() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255]));
        assert_eq!(detect_background(&img).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_most_frequent_color_wins() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([10, 200, 30, 255]));
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        assert_eq!(detect_background(&img).unwrap(), [10, 200, 30]);
    }

    #[test]
    fn test_alpha_is_ignored() {
        // Same RGB under different alpha counts as one color
        let mut img = RgbaImage::from_pixel(3, 1, Rgba([5, 5, 5, 0]));
        img.put_pixel(1, 0, Rgba([5, 5, 5, 255]));
        img.put_pixel(2, 0, Rgba([9, 9, 9, 255]));
        assert_eq!(detect_background(&img).unwrap(), [5, 5, 5]);
    }

    #[test]
    fn test_tie_goes_to_lowest_tuple() {
        let mut img = RgbaImage::new(4, 1);
        img.put_pixel(0, 0, Rgba([200, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([200, 0, 0, 255]));
        img.put_pixel(2, 0, Rgba([0, 0, 200, 255]));
        img.put_pixel(3, 0, Rgba([0, 0, 200, 255]));
        assert_eq!(detect_background(&img).unwrap(), [0, 0, 200]);

        // Order of appearance does not matter
        let flipped = image::imageops::flip_horizontal(&img);
        assert_eq!(detect_background(&flipped).unwrap(), [0, 0, 200]);
    }

    #[test]
    fn test_empty_image_is_an_error() {
        let img = RgbaImage::new(0, 0);
        assert!(matches!(detect_background(&img), Err(Error::EmptyImage)));
        assert!(matches!(detect_extremes(&img, 10), Err(Error::EmptyImage)));
    }

    #[test]
    fn test_extremes_vote() {
        let mut img = RgbaImage::from_pixel(3, 3, Rgba([3, 2, 1, 255]));
        img.put_pixel(1, 1, Rgba([250, 251, 252, 255]));
        assert_eq!(detect_extremes(&img, 10).unwrap(), BLACK);

        let img = RgbaImage::from_pixel(3, 3, Rgba([250, 251, 252, 255]));
        assert_eq!(detect_extremes(&img, 10).unwrap(), WHITE);
    }

    #[test]
    fn test_extremes_zero_tolerance_is_white() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
        assert_eq!(detect_extremes(&img, 0).unwrap(), WHITE);
    }

    #[test]
    fn test_color_share() {
        let mut img = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]));
        img.put_pixel(0, 0, Rgba([9, 9, 9, 255]));
        assert!((color_share(&img, [1, 2, 3]) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#720546").unwrap(), [0x72, 0x05, 0x46]);
        assert_eq!(parse_hex("ffffff").unwrap(), WHITE);
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#GG0000").is_err());
        assert_eq!(to_hex([0x72, 0x05, 0x46]), "#720546");
    }
}
