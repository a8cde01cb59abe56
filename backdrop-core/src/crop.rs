/// Trim transparent margins.
///
/// A fully transparent image is never cropped; the caller always gets back
/// an image with non-zero dimensions.
use image::RgbaImage;

/// Rectangle with exclusive `right` / `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// Smallest box containing both.
    pub fn union(self, other: BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// True when the box covers the whole `width` x `height` canvas.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        self.left == 0 && self.top == 0 && self.right == width && self.bottom == height
    }
}

/// Bounding box of all pixels with alpha > 0, or `None` if there are none.
pub fn content_bounds(img: &RgbaImage) -> Option<BoundingBox> {
    let mut bounds: Option<BoundingBox> = None;
    for (x, y, pixel) in img.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        let hit = BoundingBox {
            left: x,
            top: y,
            right: x + 1,
            bottom: y + 1,
        };
        bounds = Some(match bounds {
            Some(b) => b.union(hit),
            None => hit,
        });
    }
    bounds
}

/// Union of the content boxes of several images.
pub fn shared_bounds<'a>(images: impl IntoIterator<Item = &'a RgbaImage>) -> Option<BoundingBox> {
    images
        .into_iter()
        .filter_map(content_bounds)
        .reduce(BoundingBox::union)
}

/// Copy out the region described by `bounds`.
pub fn crop_to(img: &RgbaImage, bounds: BoundingBox) -> RgbaImage {
    image::imageops::crop_imm(img, bounds.left, bounds.top, bounds.width(), bounds.height())
        .to_image()
}

/// Crop to the content bounding box. Fully transparent images come back unchanged.
pub fn crop_to_content(img: &RgbaImage) -> RgbaImage {
    match content_bounds(img) {
        Some(bounds) => {
            log::debug!(
                "cropping {}x{} to {}x{} at ({}, {})",
                img.width(),
                img.height(),
                bounds.width(),
                bounds.height(),
                bounds.left,
                bounds.top
            );
            crop_to(img, bounds)
        }
        None => img.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const CLEAR: Rgba<u8> = Rgba([255, 255, 255, 0]);

    #[test]
    fn test_crops_to_red_square() {
        let mut img = RgbaImage::from_pixel(4, 4, CLEAR);
        for y in 1..3 {
            for x in 1..3 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        let out = crop_to_content(&img);
        assert_eq!(out.dimensions(), (2, 2));
        assert!(out.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_fully_transparent_unchanged() {
        let img = RgbaImage::from_pixel(10, 10, CLEAR);
        assert_eq!(content_bounds(&img), None);
        let out = crop_to_content(&img);
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out, img);
    }

    #[test]
    fn test_partial_alpha_counts_as_content() {
        let mut img = RgbaImage::from_pixel(5, 3, CLEAR);
        img.put_pixel(4, 2, Rgba([1, 1, 1, 1]));
        img.put_pixel(2, 0, Rgba([1, 1, 1, 200]));
        assert_eq!(
            content_bounds(&img),
            Some(BoundingBox {
                left: 2,
                top: 0,
                right: 5,
                bottom: 3
            })
        );
    }

    #[test]
    fn test_crop_is_idempotent() {
        let mut img = RgbaImage::from_pixel(6, 5, CLEAR);
        img.put_pixel(1, 3, Rgba([9, 9, 9, 255]));
        img.put_pixel(4, 1, Rgba([9, 9, 9, 255]));
        let once = crop_to_content(&img);
        assert!(once.width() <= img.width() && once.height() <= img.height());
        let bounds = content_bounds(&once).unwrap();
        assert!(bounds.covers(once.width(), once.height()));
        assert_eq!(crop_to_content(&once), once);
    }

    #[test]
    fn test_shared_bounds_is_union() {
        let mut a = RgbaImage::from_pixel(6, 6, CLEAR);
        a.put_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let mut b = RgbaImage::from_pixel(6, 6, CLEAR);
        b.put_pixel(4, 3, Rgba([0, 0, 0, 255]));
        let empty = RgbaImage::from_pixel(6, 6, CLEAR);
        assert_eq!(
            shared_bounds([&a, &empty, &b]),
            Some(BoundingBox {
                left: 1,
                top: 1,
                right: 5,
                bottom: 4
            })
        );
        assert_eq!(shared_bounds([&empty]), None);
    }
}
