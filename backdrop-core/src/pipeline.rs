/// Background removal pipeline:
/// detect background -> mask -> smooth alpha -> crop
///
/// Stills run the stages once. Animations detect the background on the first
/// frame and apply that color to every frame; frames are then cropped to one
/// shared bounding box so the output keeps a uniform frame size.
use image::RgbaImage;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::crop::{crop_to, crop_to_content, shared_bounds};
use crate::detect::{Detector, Rgb};
use crate::error::{Error, Result};
use crate::mask::mask_background;
use crate::smooth::{smooth_alpha, DEFAULT_ITERATIONS};

/// Default color tolerance.
pub const DEFAULT_TOLERANCE: u8 = 10;

/// A single animation frame and how long it is shown.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub image: RgbaImage,
    pub duration_ms: u32,
}

/// Ordered frames of identical size. `loop_count` 0 loops forever.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub frames: Vec<AnimationFrame>,
    pub loop_count: u16,
}

impl Animation {
    pub fn new(frames: Vec<AnimationFrame>) -> Self {
        Self {
            frames,
            loop_count: 0,
        }
    }

    pub fn durations(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.duration_ms).collect()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.image.dimensions())
    }
}

/// Processing parameters for background removal.
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalParams {
    pub tolerance: u8,
    pub crop: bool,
    /// Alpha smoothing passes, 0 disables smoothing.
    pub smooth_iterations: u32,
    pub detector: Detector,
    /// Skip detection and key out this color instead.
    pub background: Option<Rgb>,
}

impl Default for RemovalParams {
    fn default() -> Self {
        Self::standard()
    }
}

impl RemovalParams {
    pub fn standard() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            crop: true,
            smooth_iterations: DEFAULT_ITERATIONS,
            detector: Detector::Dominant,
            background: None,
        }
    }

    /// Exact color match, hard edges.
    pub fn exact() -> Self {
        Self {
            tolerance: 0,
            smooth_iterations: 0,
            ..Self::standard()
        }
    }

    /// Wider tolerance and extra feathering for noisy or dithered backdrops.
    pub fn soft() -> Self {
        Self {
            tolerance: 24,
            smooth_iterations: 3,
            ..Self::standard()
        }
    }

    pub fn from_preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "exact" => Some(Self::exact()),
            "soft" => Some(Self::soft()),
            _ => None,
        }
    }

    pub fn all_presets() -> Vec<(&'static str, Self)> {
        vec![
            ("standard", Self::standard()),
            ("exact", Self::exact()),
            ("soft", Self::soft()),
        ]
    }

    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_crop(mut self, crop: bool) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_smooth_iterations(mut self, iterations: u32) -> Self {
        self.smooth_iterations = iterations;
        self
    }

    pub fn with_detector(mut self, detector: Detector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = Some(background);
        self
    }

    /// The fixed background, or the one detected on `img`.
    pub fn resolve_background(&self, img: &RgbaImage) -> Result<Rgb> {
        if img.width() == 0 || img.height() == 0 {
            return Err(Error::EmptyImage);
        }
        match self.background {
            Some(color) => Ok(color),
            None => self.detector.detect(img, self.tolerance),
        }
    }

    /// Mask then smooth, without cropping.
    fn key_frame(&self, img: &RgbaImage, background: Rgb) -> RgbaImage {
        let masked = mask_background(img, background, self.tolerance);
        if self.smooth_iterations > 0 {
            smooth_alpha(&masked, self.smooth_iterations)
        } else {
            masked
        }
    }
}

/// Run the full pipeline on a still image. Returns the result and the
/// background color that was keyed out.
pub fn process_still(img: &RgbaImage, params: &RemovalParams) -> Result<(RgbaImage, Rgb)> {
    let background = params.resolve_background(img)?;
    let keyed = params.key_frame(img, background);
    let out = if params.crop {
        crop_to_content(&keyed)
    } else {
        keyed
    };
    Ok((out, background))
}

/// Run the full pipeline on every frame of an animation.
///
/// Frame order, durations and loop count are kept. With cropping enabled all
/// frames are cut to the union of their content boxes.
pub fn process_animation(
    animation: &Animation,
    params: &RemovalParams,
) -> Result<(Animation, Rgb)> {
    let first = animation.frames.first().ok_or(Error::EmptyImage)?;
    let background = params.resolve_background(&first.image)?;

    #[cfg(feature = "parallel")]
    let keyed: Vec<RgbaImage> = animation
        .frames
        .par_iter()
        .map(|frame| params.key_frame(&frame.image, background))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let keyed: Vec<RgbaImage> = animation
        .frames
        .iter()
        .map(|frame| params.key_frame(&frame.image, background))
        .collect();

    let bounds = if params.crop {
        shared_bounds(&keyed)
    } else {
        None
    };
    let keyed: Vec<RgbaImage> = match bounds {
        Some(bounds) => {
            log::debug!(
                "cropping {} frames to shared {}x{} box at ({}, {})",
                keyed.len(),
                bounds.width(),
                bounds.height(),
                bounds.left,
                bounds.top
            );
            keyed.iter().map(|img| crop_to(img, bounds)).collect()
        }
        None => keyed,
    };

    let frames = keyed
        .into_iter()
        .zip(&animation.frames)
        .map(|(image, source)| AnimationFrame {
            image,
            duration_ms: source.duration_ms,
        })
        .collect();

    Ok((
        Animation {
            frames,
            loop_count: animation.loop_count,
        },
        background,
    ))
}
