use backdrop_core::batch::{process_directory, process_file, DirectoryReport, OutputTarget};
use backdrop_core::codec::decode;
use backdrop_core::crop::content_bounds;
use backdrop_core::detect::{color_share, parse_hex, to_hex, Detector};
use backdrop_core::mask::mask_background;
use backdrop_core::pipeline::{RemovalParams, DEFAULT_TOLERANCE};
use clap::{Parser, Subcommand};
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "backdrop",
    about = "Make the flat background of images and GIF animations transparent"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an image file, or every supported image in a directory
    Process {
        /// Input image or directory
        input: PathBuf,

        /// Per-channel color tolerance (0 = exact match)
        #[arg(long, short)]
        tolerance: Option<u8>,

        /// Keep the original canvas size
        #[arg(long)]
        no_crop: bool,

        /// Keep hard mask edges
        #[arg(long)]
        no_smooth: bool,

        /// Number of alpha smoothing passes
        #[arg(long)]
        smooth_iterations: Option<u32>,

        /// Use a named preset (individual flags still override it): standard, exact, soft
        #[arg(long)]
        preset: Option<String>,

        /// Background detector: dominant, extremes
        #[arg(long)]
        detector: Option<String>,

        /// Key out this color instead of detecting one (e.g. "#00FF00")
        #[arg(long)]
        color: Option<String>,

        /// Output path for a single file (default: <name>_transparent.png or .gif)
        #[arg(long, short, conflicts_with = "in_place")]
        output: Option<PathBuf>,

        /// Overwrite the input file (non-PNG stills are written next to it as .png)
        #[arg(long)]
        in_place: bool,

        /// Reprocess even if output is up-to-date (directories only)
        #[arg(long)]
        force: bool,

        /// Number of parallel jobs (default: num_cpus)
        #[arg(long, short)]
        jobs: Option<usize>,
    },

    /// Report the detected background color and content bounds of an image
    Detect {
        /// Input image
        input: PathBuf,

        /// Per-channel color tolerance used for masking
        #[arg(long, short, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: u8,

        /// Background detector: dominant, extremes
        #[arg(long)]
        detector: Option<String>,

        /// Save the background mask (white = kept) to this path
        #[arg(long)]
        mask_output: Option<PathBuf>,
    },
}

fn resolve_detector(name: &Option<String>) -> Result<Detector, Box<dyn std::error::Error>> {
    match name {
        None => Ok(Detector::default()),
        Some(name) => Detector::from_name(name).ok_or_else(|| {
            format!(
                "Unknown detector '{}'. Available: {}",
                name,
                Detector::all_names().join(", ")
            )
            .into()
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_params(
    preset: &Option<String>,
    tolerance: Option<u8>,
    no_crop: bool,
    no_smooth: bool,
    smooth_iterations: Option<u32>,
    detector: &Option<String>,
    color: &Option<String>,
) -> Result<RemovalParams, Box<dyn std::error::Error>> {
    let mut params = match preset {
        Some(name) => RemovalParams::from_preset(name).ok_or_else(|| {
            let names: Vec<_> = RemovalParams::all_presets()
                .into_iter()
                .map(|(n, _)| n)
                .collect();
            format!("Unknown preset '{}'. Available: {}", name, names.join(", "))
        })?,
        None => RemovalParams::standard(),
    };

    if let Some(t) = tolerance {
        params = params.with_tolerance(t);
    }
    if no_crop {
        params = params.with_crop(false);
    }
    if let Some(n) = smooth_iterations {
        params = params.with_smooth_iterations(n);
    }
    if no_smooth {
        params = params.with_smooth_iterations(0);
    }
    if detector.is_some() {
        params = params.with_detector(resolve_detector(detector)?);
    }
    if let Some(hex) = color {
        params = params.with_background(parse_hex(hex)?);
    }
    Ok(params)
}

/// One stdout line per supported file of a directory run.
fn report_lines(report: &DirectoryReport) -> Vec<String> {
    let skipped = report
        .skipped
        .iter()
        .map(|path| format!("Skipped (up-to-date): {}", path.display()));
    let outcomes = report.outcomes.iter().map(|outcome| match &outcome.result {
        Ok(file) => file.output.display().to_string(),
        Err(e) => format!("Error: {}", e),
    });
    skipped.chain(outcomes).collect()
}

fn cmd_process(
    input: &Path,
    target: OutputTarget,
    params: &RemovalParams,
    force: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    log::debug!("Parameters: {:?}", params);

    if input.is_file() {
        return Ok(match process_file(input, &target, params) {
            Ok(report) => {
                println!("{}", report.output.display());
                true
            }
            Err(e) => {
                println!("Error: {}", e);
                false
            }
        });
    }

    if input.is_dir() {
        if matches!(target, OutputTarget::Explicit(_)) {
            return Err("--output only applies to a single file".into());
        }
        let report = process_directory(input, &target, params, force)?;
        for line in report_lines(&report) {
            println!("{}", line);
        }
        log::info!(
            "Done! Processed: {}, Skipped: {}, Errors: {}",
            report.processed(),
            report.skipped.len(),
            report.failed()
        );
        return Ok(report.failed() == 0);
    }

    println!(
        "Error: {} is not a valid file or directory.",
        input.display()
    );
    Ok(false)
}

fn cmd_detect(
    input: &Path,
    tolerance: u8,
    detector: Detector,
    mask_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let decoded = decode(&bytes, input)?;
    let first = decoded
        .first_image()
        .ok_or(backdrop_core::Error::EmptyImage)?;

    let background = detector.detect(first, tolerance)?;
    let masked = mask_background(first, background, tolerance);
    let (width, height) = first.dimensions();

    println!("Image: {}", input.display());
    println!("Dimensions: {}x{}", width, height);
    println!("Frames: {}", decoded.frame_count());
    println!("Detector: {:?}", detector);
    println!(
        "Background: {} ({:.2}% of pixels)",
        to_hex(background),
        color_share(first, background) * 100.0
    );
    println!(
        "Masked: {} pixels at tolerance {}",
        masked.pixels().filter(|p| p[3] == 0).count(),
        tolerance
    );
    match content_bounds(&masked) {
        Some(b) => println!(
            "Content: {}x{} at ({}, {})",
            b.width(),
            b.height(),
            b.left,
            b.top
        ),
        None => println!("Content: none (image is entirely background)"),
    }

    if let Some(out_path) = mask_output {
        let mask = GrayImage::from_fn(width, height, |x, y| {
            Luma([if masked.get_pixel(x, y)[3] == 0 { 0 } else { 255 }])
        });
        mask.save(out_path)?;
        println!("Mask saved to: {}", out_path.display());
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            tolerance,
            no_crop,
            no_smooth,
            smooth_iterations,
            preset,
            detector,
            color,
            output,
            in_place,
            force,
            jobs,
        } => {
            let params = build_params(
                &preset,
                tolerance,
                no_crop,
                no_smooth,
                smooth_iterations,
                &detector,
                &color,
            )?;

            let target = match (output, in_place) {
                (Some(path), _) => OutputTarget::Explicit(path),
                (None, true) => OutputTarget::InPlace,
                (None, false) => OutputTarget::Suffixed,
            };

            // Configure thread pool
            if let Some(n) = jobs {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build_global()
                    .ok();
            }

            if !cmd_process(&input, target, &params, force)? {
                std::process::exit(1);
            }
        }

        Commands::Detect {
            input,
            tolerance,
            detector,
            mask_output,
        } => {
            let detector = resolve_detector(&detector)?;
            cmd_detect(&input, tolerance, detector, mask_output.as_deref())?;
        }
    }

    Ok(())
}
