/// 3x3 alpha smoothing with kernel:
/// ```text
/// 1  1  1
/// 1  5  1
/// 1  1  1
/// ```
/// divided by 13 and rounded to nearest. Only the alpha channel changes.
/// The outermost row and column on each side are copied through unchanged,
/// as PIL's `ImageFilter.SMOOTH` does.
use image::RgbaImage;

const KERNEL: [[u32; 3]; 3] = [[1, 1, 1], [1, 5, 1], [1, 1, 1]];
const KERNEL_SUM: u32 = 13;

/// Default number of smoothing passes used by the pipeline.
pub const DEFAULT_ITERATIONS: u32 = 2;

/// One smoothing pass over a flat alpha buffer.
pub fn smooth_pass(alpha: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    debug_assert_eq!(alpha.len(), w * h);

    let mut output = alpha.to_vec();
    if w < 3 || h < 3 {
        return output;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = 0u32;
            for (ky, row) in KERNEL.iter().enumerate() {
                let sy = y + ky - 1;
                for (kx, &weight) in row.iter().enumerate() {
                    acc += weight * alpha[sy * w + x + kx - 1] as u32;
                }
            }
            output[y * w + x] = ((acc + KERNEL_SUM / 2) / KERNEL_SUM).min(255) as u8;
        }
    }

    output
}

/// Smooth the alpha channel `iterations` times, leaving RGB untouched.
pub fn smooth_alpha(img: &RgbaImage, iterations: u32) -> RgbaImage {
    let (width, height) = img.dimensions();
    let mut out = img.clone();
    if iterations == 0 || width == 0 || height == 0 {
        return out;
    }

    let mut alpha: Vec<u8> = img.pixels().map(|p| p[3]).collect();
    for _ in 0..iterations {
        alpha = smooth_pass(&alpha, width, height);
    }

    for (pixel, a) in out.pixels_mut().zip(alpha) {
        pixel[3] = a;
    }
    out
}
