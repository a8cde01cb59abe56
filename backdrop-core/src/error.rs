use std::path::PathBuf;

/// Failures of a single file or image. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Path missing, unsupported format or corrupt data.
    #[error("cannot read {}: {reason}", .path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    /// Zero pixels, or an animation without frames.
    #[error("image has no pixels")]
    EmptyImage,

    /// Writing the output file failed.
    #[error("cannot write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder rejected the processed image.
    #[error("cannot encode output: {0}")]
    Encode(#[from] image::ImageError),

    #[error("invalid color '{0}': expected 6 hex digits like #00FF00")]
    InvalidColor(String),
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::UnreadableFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::WriteFailure {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
