/// File and directory processing.
///
/// Every file is read completely and its output fully encoded before anything
/// is written, so the output may safely be the input path itself. Errors stay
/// per file: a directory run reports them and carries on.
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::codec::{decode, encode, output_format_for_file, process_decoded, OutputFormat};
use crate::detect::Rgb;
use crate::error::{Error, Result};
use crate::pipeline::RemovalParams;

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp"];

/// Appended to the file stem of every generated output.
pub const OUTPUT_SUFFIX: &str = "_transparent";

/// Where a processed file is written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    /// `<dir>/<stem>_transparent.<png|gif>` next to the input.
    #[default]
    Suffixed,
    /// Overwrite the input. Non-PNG stills get a `.png` sibling instead,
    /// unless that sibling already exists; then the suffixed path is used.
    InPlace,
    Explicit(PathBuf),
}

impl OutputTarget {
    pub fn resolve(&self, input: &Path, format: OutputFormat) -> PathBuf {
        match self {
            OutputTarget::Suffixed => default_output_path(input, format),
            OutputTarget::InPlace => {
                if has_extension(input, format) {
                    return input.to_path_buf();
                }
                let sibling = input.with_extension(format.extension());
                if sibling.exists() {
                    default_output_path(input, format)
                } else {
                    sibling
                }
            }
            OutputTarget::Explicit(path) => path.clone(),
        }
    }
}

fn has_extension(path: &Path, format: OutputFormat) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(format.extension()))
        .unwrap_or(false)
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// True for files this tool wrote on an earlier run.
pub fn is_generated_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.ends_with(OUTPUT_SUFFIX))
        .unwrap_or(false)
}

pub fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}{}.{}", stem, OUTPUT_SUFFIX, format.extension()))
}

/// What happened to one successfully processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub background: Rgb,
    pub frames: usize,
}

/// Process one file and write the result.
pub fn process_file(
    input: &Path,
    target: &OutputTarget,
    params: &RemovalParams,
) -> Result<FileReport> {
    let bytes = std::fs::read(input).map_err(|e| Error::unreadable(input, e))?;
    let decoded = decode(&bytes, input)?;
    let processed = process_decoded(&decoded, params)?;
    let encoded = encode(&processed.output)?;

    let output = target.resolve(input, processed.output.output_format());
    std::fs::write(&output, encoded).map_err(|e| Error::write_failure(&output, e))?;

    log::info!(
        "{} -> {} (background {}, {} frame(s))",
        input.display(),
        output.display(),
        crate::detect::to_hex(processed.background),
        processed.output.frame_count()
    );
    Ok(FileReport {
        input: input.to_path_buf(),
        output,
        background: processed.background,
        frames: processed.output.frame_count(),
    })
}

/// Per-file result of a directory run.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<FileReport>,
}

#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub outcomes: Vec<FileOutcome>,
    /// Inputs whose output was newer than the input.
    pub skipped: Vec<PathBuf>,
}

impl DirectoryReport {
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.processed()
    }
}

/// Output already exists and was modified after the input.
fn is_up_to_date(input: &Path, output: &Path) -> bool {
    if input == output || !output.exists() {
        return false;
    }
    match (input.metadata(), output.metadata()) {
        (Ok(in_meta), Ok(out_meta)) => match (in_meta.modified(), out_meta.modified()) {
            (Ok(in_time), Ok(out_time)) => out_time > in_time,
            _ => false,
        },
        _ => false,
    }
}

/// Source images directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| Error::unreadable(dir, e))?
        .filter_map(|entry| entry.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image_file(p) && !is_generated_file(p))
        .collect();
    images.sort();
    Ok(images)
}

/// Process every supported image in `dir`. Only a failure to list the
/// directory is returned as an error; per-file failures land in the report.
pub fn process_directory(
    dir: &Path,
    target: &OutputTarget,
    params: &RemovalParams,
    force: bool,
) -> Result<DirectoryReport> {
    let images = list_images(dir)?;
    log::info!("Found {} source images in {}", images.len(), dir.display());

    let (pending, skipped): (Vec<PathBuf>, Vec<PathBuf>) = images.into_iter().partition(|p| {
        force || !is_up_to_date(p, &target.resolve(p, output_format_for_file(p)))
    });
    for path in &skipped {
        log::info!("Skipping up-to-date {}", path.display());
    }

    let run = |input: &PathBuf| {
        let result = process_file(input, target, params);
        if let Err(ref e) = result {
            log::warn!("{}", e);
        }
        FileOutcome {
            input: input.clone(),
            result,
        }
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<FileOutcome> = pending.par_iter().map(run).collect();
    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<FileOutcome> = pending.iter().map(run).collect();

    Ok(DirectoryReport { outcomes, skipped })
}
