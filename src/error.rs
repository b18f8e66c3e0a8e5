//! Error types for slidesync

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for slidesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for slidesync operations
#[derive(Error, Debug)]
pub enum Error {
    /// Timing table lacks one or more required columns
    #[error("Timing table is missing required column(s): {}", .missing.join(", "))]
    MissingColumn { missing: Vec<String> },

    /// A start_time value matches none of the accepted formats
    #[error("Unknown time format: {0:?} (expected SS, MM:SS or HH:MM:SS[.frac])")]
    UnknownTimeFormat(String),

    /// Sorted start times still decrease somewhere
    #[error("Start times are not in ascending order at row {index}: {current}s follows {previous}s")]
    NonMonotonic {
        index: usize,
        previous: f64,
        current: f64,
    },

    /// Two slides share the same start time (strict validation only)
    #[error("Slides {first:?} and {second:?} share start time {seconds}s")]
    DuplicateStartTime {
        first: String,
        second: String,
        seconds: f64,
    },

    /// Filenames in the timing table with no matching image
    #[error("Image file(s) not found: {}", .0.join(", "))]
    MissingImage(Vec<String>),

    /// Resolution string is not `WxH` with positive integers, or is unusable
    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    /// A slide image failed to decode
    #[error("Failed to load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The audio track failed to decode or report a duration
    #[error("Failed to load audio {path:?}: {reason}")]
    AudioLoad { path: PathBuf, reason: String },

    /// The final encode/write step failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// ffmpeg/ffprobe missing or lacking a required encoder
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// Uploaded content exceeds the configured limits
    #[error("Upload limit exceeded: {0}")]
    UploadLimit(String),

    /// Invalid input parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O failure on a named file or directory
    #[error("Cannot access {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub(crate) fn file_access(path: &Path, source: std::io::Error) -> Self {
        Error::FileAccess {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Error code for FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Invalid input parameter
    InvalidInput = 1,
    /// Timing table missing required columns
    MissingColumn = 2,
    /// Unparseable start time
    UnknownTimeFormat = 3,
    /// Start times out of order or duplicated in strict mode
    NonMonotonic = 4,
    /// Referenced images not supplied
    MissingImage = 5,
    /// Bad resolution
    InvalidResolution = 6,
    /// Image decode failure
    ImageLoad = 7,
    /// Audio decode failure
    AudioLoad = 8,
    /// Encoding failure
    EncodeError = 9,
    /// ffmpeg/ffprobe unavailable
    ToolUnavailable = 10,
    /// I/O error
    IoError = 11,
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::MissingColumn { .. } => ErrorCode::MissingColumn,
            Error::UnknownTimeFormat(_) => ErrorCode::UnknownTimeFormat,
            Error::NonMonotonic { .. } => ErrorCode::NonMonotonic,
            Error::DuplicateStartTime { .. } => ErrorCode::NonMonotonic,
            Error::MissingImage(_) => ErrorCode::MissingImage,
            Error::InvalidResolution(_) => ErrorCode::InvalidResolution,
            Error::ImageLoad { .. } => ErrorCode::ImageLoad,
            Error::AudioLoad { .. } => ErrorCode::AudioLoad,
            Error::Encoding(_) => ErrorCode::EncodeError,
            Error::ToolUnavailable(_) => ErrorCode::ToolUnavailable,
            Error::UploadLimit(_) => ErrorCode::InvalidInput,
            Error::InvalidInput(_) => ErrorCode::InvalidInput,
            Error::FileAccess { .. } | Error::Io(_) => ErrorCode::IoError,
            Error::Csv(_) => ErrorCode::InvalidInput,
        }
    }
}
