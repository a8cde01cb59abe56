/// EXIF orientation correction for stills.
///
/// Camera JPEGs store pixels in sensor order and record the intended rotation
/// in the Orientation tag. Detection and cropping must see the upright image,
/// otherwise the crop box lands on the wrong side.
///
/// 1 = Normal
/// 2 = Flipped horizontally
/// 3 = Rotated 180°
/// 4 = Flipped vertically
/// 5 = Transposed (flip horizontal + rotate 270° CW)
/// 6 = Rotated 90° CW
/// 7 = Transverse (flip horizontal + rotate 90° CW)
/// 8 = Rotated 270° CW
use image::DynamicImage;
use std::io::Cursor;

/// Read the EXIF orientation from file bytes. Returns None if unreadable or missing.
pub fn read_exif_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let orientation = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    orientation.value.get_uint(0)
}

/// Upright `img` according to the orientation stored in `bytes`.
/// Without a usable tag the image is returned unchanged.
pub fn apply_exif_orientation_from_bytes(img: DynamicImage, bytes: &[u8]) -> DynamicImage {
    match read_exif_orientation(bytes) {
        Some(orientation @ 2..=8) => {
            log::debug!("applying EXIF orientation {}", orientation);
            apply_orientation(img, orientation)
        }
        _ => img,
    }
}

fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate270().fliph(),
        6 => img.rotate90(),
        7 => img.rotate90().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
