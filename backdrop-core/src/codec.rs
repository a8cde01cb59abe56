/// Decoding inputs into stills or animations and encoding results.
///
/// GIF input always stays GIF, even with a single frame. Everything else is
/// written as PNG so the alpha channel survives.
use std::io::{Cursor, Read};
use std::path::Path;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame, ImageFormat, RgbaImage};

use crate::detect::Rgb;
use crate::error::{Error, Result};
use crate::exif_orientation::apply_exif_orientation_from_bytes;
use crate::pipeline::{process_animation, process_still, Animation, AnimationFrame, RemovalParams};

/// Input formats the pipeline accepts.
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// Bytes read from a file header for format sniffing.
const SNIFF_LEN: u64 = 64;

/// Frame duration used when a GIF frame declares a zero delay.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Gif,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
        }
    }

    /// Output format implied by an input path's extension.
    pub fn for_input(path: &Path) -> Self {
        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Gif) => OutputFormat::Gif,
            _ => OutputFormat::Png,
        }
    }
}

/// Output format of the file at `path`, decided from its content the same way
/// [`decode`] does. Falls back to the extension when the header is unreadable
/// or unrecognised.
pub fn output_format_for_file(path: &Path) -> OutputFormat {
    let mut header = Vec::new();
    let sniffed = std::fs::File::open(path)
        .and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut header))
        .ok()
        .and_then(|_| image::guess_format(&header).ok());
    match sniffed {
        Some(ImageFormat::Gif) => OutputFormat::Gif,
        Some(_) => OutputFormat::Png,
        None => OutputFormat::for_input(path),
    }
}

/// A decoded input, tagged with how it has to be written back.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Still(RgbaImage),
    Animated(Animation),
}

impl Decoded {
    pub fn output_format(&self) -> OutputFormat {
        match self {
            Decoded::Still(_) => OutputFormat::Png,
            Decoded::Animated(_) => OutputFormat::Gif,
        }
    }

    pub fn frame_count(&self) -> usize {
        match self {
            Decoded::Still(_) => 1,
            Decoded::Animated(animation) => animation.frames.len(),
        }
    }

    /// The image detection runs on: the still itself or the first frame.
    pub fn first_image(&self) -> Option<&RgbaImage> {
        match self {
            Decoded::Still(img) => Some(img),
            Decoded::Animated(animation) => animation.frames.first().map(|f| &f.image),
        }
    }
}

/// Sniff the format from content, falling back to the path's extension.
pub fn detect_format(bytes: &[u8], path: &Path) -> Result<ImageFormat> {
    let format = image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|e| Error::unreadable(path, e))?;
    if SUPPORTED_FORMATS.contains(&format) {
        Ok(format)
    } else {
        Err(Error::unreadable(
            path,
            format!("unsupported format {:?}", format),
        ))
    }
}

/// Decode an in-memory file. `path` is used for format fallback and error messages.
pub fn decode(bytes: &[u8], path: &Path) -> Result<Decoded> {
    match detect_format(bytes, path)? {
        ImageFormat::Gif => decode_gif(bytes, path).map(Decoded::Animated),
        format => {
            let img = image::load_from_memory_with_format(bytes, format)
                .map_err(|e| Error::unreadable(path, e))?;
            let img = apply_exif_orientation_from_bytes(img, bytes);
            Ok(Decoded::Still(img.to_rgba8()))
        }
    }
}

fn decode_gif(bytes: &[u8], path: &Path) -> Result<Animation> {
    let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(|e| Error::unreadable(path, e))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| Error::unreadable(path, e))?;

    let frames: Vec<AnimationFrame> = frames
        .into_iter()
        .map(|frame| {
            let duration_ms = delay_to_ms(frame.delay());
            AnimationFrame {
                image: frame.into_buffer(),
                duration_ms,
            }
        })
        .collect();

    if frames.is_empty() {
        return Err(Error::EmptyImage);
    }
    log::debug!("decoded {} GIF frames from {}", frames.len(), path.display());
    Ok(Animation::new(frames))
}

/// Zero delays become [`DEFAULT_FRAME_DURATION_MS`].
fn delay_to_ms(delay: Delay) -> u32 {
    let (numer, denom) = delay.numer_denom_ms();
    let ms = if denom == 0 {
        0
    } else {
        (numer + denom / 2) / denom
    };
    if ms == 0 {
        DEFAULT_FRAME_DURATION_MS
    } else {
        ms
    }
}

pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

pub fn encode_gif(animation: &Animation) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut output);
        let repeat = match animation.loop_count {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        };
        encoder.set_repeat(repeat)?;
        encoder.encode_frames(animation.frames.iter().map(|f| {
            Frame::from_parts(
                f.image.clone(),
                0,
                0,
                Delay::from_numer_denom_ms(f.duration_ms, 1),
            )
        }))?;
    }
    Ok(output)
}

pub fn encode(decoded: &Decoded) -> Result<Vec<u8>> {
    match decoded {
        Decoded::Still(img) => encode_png(img),
        Decoded::Animated(animation) => encode_gif(animation),
    }
}

/// Result of running the pipeline on a decoded input.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub output: Decoded,
    pub background: Rgb,
}

/// Run the still or animation pipeline, whichever fits the input.
pub fn process_decoded(decoded: &Decoded, params: &RemovalParams) -> Result<Processed> {
    let (output, background) = match decoded {
        Decoded::Still(img) => {
            let (img, bg) = process_still(img, params)?;
            (Decoded::Still(img), bg)
        }
        Decoded::Animated(animation) => {
            let (animation, bg) = process_animation(animation, params)?;
            (Decoded::Animated(animation), bg)
        }
    };
    Ok(Processed { output, background })
}

/// Encoded result of [`process_bytes`].
#[derive(Debug, Clone)]
pub struct EncodedOutput {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub background: Rgb,
    pub frames: usize,
}

/// Decode, process and encode an in-memory file in one call.
pub fn process_bytes(bytes: &[u8], name: &Path, params: &RemovalParams) -> Result<EncodedOutput> {
    let decoded = decode(bytes, name)?;
    let processed = process_decoded(&decoded, params)?;
    Ok(EncodedOutput {
        bytes: encode(&processed.output)?,
        format: processed.output.output_format(),
        background: processed.background,
        frames: processed.output.frame_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn red_square_png() -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        for y in 1..3 {
            for x in 1..3 {
                img.put_pixel(x, y, Rgba([255, 0, 0, 255]));
            }
        }
        encode_png(&img).unwrap()
    }

    fn gif_with_delays(delays: &[u32]) -> Vec<u8> {
        let frames = delays
            .iter()
            .enumerate()
            .map(|(i, &ms)| {
                let mut img = RgbaImage::from_pixel(6, 6, Rgba([255, 255, 255, 255]));
                img.put_pixel(i as u32 + 1, 2, Rgba([0, 0, 255, 255]));
                AnimationFrame {
                    image: img,
                    duration_ms: ms,
                }
            })
            .collect();
        encode_gif(&Animation::new(frames)).unwrap()
    }

    fn three_frame_gif() -> Vec<u8> {
        gif_with_delays(&[100, 150, 200])
    }

    #[test]
    fn test_gif_keeps_frames_and_durations() {
        let bytes = three_frame_gif();
        let decoded = decode(&bytes, Path::new("anim.gif")).unwrap();
        match &decoded {
            Decoded::Animated(animation) => {
                assert_eq!(animation.durations(), vec![100, 150, 200]);
                assert_eq!(animation.loop_count, 0);
            }
            other => panic!("expected animation, got {:?}", other.output_format()),
        }
    }

    #[test]
    fn test_zero_delay_gets_default_duration() {
        let bytes = gif_with_delays(&[0, 150]);
        match decode(&bytes, Path::new("anim.gif")).unwrap() {
            Decoded::Animated(animation) => {
                assert_eq!(animation.durations(), vec![DEFAULT_FRAME_DURATION_MS, 150]);
            }
            other => panic!("expected animation, got {:?}", other.output_format()),
        }
    }

    #[test]
    fn test_animation_pipeline_round_trip() {
        let params = RemovalParams::exact();
        let out = process_bytes(&three_frame_gif(), Path::new("anim.gif"), &params).unwrap();
        assert_eq!(out.format, OutputFormat::Gif);
        assert_eq!(out.background, [255, 255, 255]);
        assert_eq!(out.frames, 3);

        let reread = decode(&out.bytes, Path::new("out.gif")).unwrap();
        match reread {
            Decoded::Animated(animation) => {
                assert_eq!(animation.durations(), vec![100, 150, 200]);
                // shared box spans x 1..4, y 2..3
                assert_eq!(animation.dimensions(), Some((3, 1)));
            }
            other => panic!("expected animation, got {:?}", other.output_format()),
        }
    }

    #[test]
    fn test_still_becomes_png_with_alpha() {
        let params = RemovalParams::exact();
        let out = process_bytes(&red_square_png(), Path::new("sq.png"), &params).unwrap();
        assert_eq!(out.format, OutputFormat::Png);
        assert_eq!(out.frames, 1);

        let img = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (2, 2));
        assert!(img.pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_format_falls_back_to_extension() {
        assert_eq!(OutputFormat::for_input(Path::new("a/b.GIF")), OutputFormat::Gif);
        assert_eq!(OutputFormat::for_input(Path::new("a/b.jpeg")), OutputFormat::Png);
    }

    #[test]
    fn test_output_format_for_file_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let disguised = dir.path().join("anim.png");
        std::fs::write(&disguised, three_frame_gif()).unwrap();
        assert_eq!(output_format_for_file(&disguised), OutputFormat::Gif);

        let still = dir.path().join("still.gif");
        std::fs::write(&still, red_square_png()).unwrap();
        assert_eq!(output_format_for_file(&still), OutputFormat::Png);

        // unreadable content falls back to the extension
        let junk = dir.path().join("junk.gif");
        std::fs::write(&junk, b"??").unwrap();
        assert_eq!(output_format_for_file(&junk), OutputFormat::Gif);
        assert_eq!(
            output_format_for_file(&dir.path().join("missing.bmp")),
            OutputFormat::Png
        );
    }

    #[test]
    fn test_oversized_gif_frame_is_encode_error() {
        // GIF frame sizes are 16-bit
        let animation = Animation::new(vec![AnimationFrame {
            image: RgbaImage::new(70_000, 1),
            duration_ms: 100,
        }]);
        assert!(matches!(encode_gif(&animation), Err(Error::Encode(_))));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let result = decode(b"definitely not an image", Path::new("junk.png"));
        assert!(matches!(result, Err(Error::UnreadableFile { .. })));
    }

    #[test]
    fn test_unsupported_format_is_unreadable() {
        let mut tiff = Vec::new();
        RgbaImage::new(2, 2)
            .write_to(&mut Cursor::new(&mut tiff), ImageFormat::Tiff)
            .unwrap();
        let result = decode(&tiff, Path::new("img.tiff"));
        assert!(matches!(result, Err(Error::UnreadableFile { .. })));
    }
}
