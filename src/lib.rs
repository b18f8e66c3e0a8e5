//! slidesync - narrated slideshow videos from slides, audio and a timing table
//!
//! Each slide named in the timing table is shown from its start time until
//! the next slide starts; the last slide holds until the audio ends. Slides
//! are letterboxed to the output resolution and encoded with the audio as an
//! H.264/AAC MP4.
//!
//! Entry points:
//! - [`sync`]: run the pipeline on files on disk
//! - [`upload::handle`]: run it on uploaded content held in memory
//! - [`ffi`]: C ABI over [`sync`]

pub mod audio;
pub mod encoder;
pub mod error;
pub mod ffi;
pub mod image_loader;
pub mod muxer;
pub mod schedule;
pub mod timecode;
pub mod timing;
pub mod upload;

mod pipeline;
mod slideshow;

pub use error::{Error, Result};
pub use pipeline::{sync, sync_with_progress, Job, Progress, RunSummary};
pub use slideshow::{SequenceSummary, Sequencer, SlideSegment};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Parse `WxH`, e.g. `1920x1080`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidResolution(format!("{:?} (expected WxH, e.g. 1920x1080)", s));

        let (w, h) = s.trim().split_once('x').ok_or_else(invalid)?;
        let dimension = |part: &str| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            part.parse::<u32>().ok().filter(|v| *v > 0)
        };

        match (dimension(w), dimension(h)) {
            (Some(width), Some(height)) => Ok(Self::new(width, height)),
            _ => Err(invalid()),
        }
    }
}

/// Parse a `WxH` resolution string
pub fn parse_resolution(s: &str) -> Result<Resolution> {
    s.parse()
}

/// Policy for slides sharing a start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Accept them; the earlier slide shows for the minimum duration
    #[default]
    Lenient,
    /// Reject the table
    Strict,
}

/// Codec parameters passed through to the encoding engine
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    /// x264 preset
    pub preset: String,
    /// x264 constant rate factor (0-51, lower is better)
    pub crf: u8,
    /// AAC bitrate, e.g. `192k`
    pub audio_bitrate: String,
    /// Encoder worker threads
    pub threads: u32,
    /// Path to ffmpeg executable; ffprobe is expected next to it
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            preset: "medium".to_string(),
            crf: 23,
            audio_bitrate: "192k".to_string(),
            threads: 4,
            ffmpeg_path: None,
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    /// Output frame size
    pub resolution: Resolution,
    /// Frames per second
    pub fps: u32,
    /// Seconds appended after the audio ends
    pub end_padding: f64,
    /// Codec parameters
    pub encode: EncodeOptions,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            fps: 30,
            end_padding: 0.0,
            encode: EncodeOptions::default(),
        }
    }
}

impl OutputSpec {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let Resolution { width, height } = self.resolution;
        if width == 0 || height == 0 {
            return Err(Error::InvalidResolution(format!(
                "{} (dimensions must be positive)",
                self.resolution
            )));
        }
        if width % 2 != 0 || height % 2 != 0 {
            // yuv420p output needs even dimensions
            return Err(Error::InvalidResolution(format!(
                "{} (H.264 output requires even dimensions)",
                self.resolution
            )));
        }
        if self.fps == 0 {
            return Err(Error::InvalidInput("Frame rate must be positive".to_string()));
        }
        if !self.end_padding.is_finite() || self.end_padding < 0.0 {
            return Err(Error::InvalidInput(format!(
                "End padding must be a non-negative number of seconds, got {}",
                self.end_padding
            )));
        }
        if self.encode.crf > 51 {
            return Err(Error::InvalidInput(format!(
                "CRF must be between 0 and 51, got {}",
                self.encode.crf
            )));
        }
        if self.encode.threads == 0 {
            return Err(Error::InvalidInput("Thread count must be positive".to_string()));
        }
        Ok(())
    }
}

/// Check that the encoding engine is available on this system
pub fn available(ffmpeg_path: Option<&Path>) -> Result<()> {
    encoder::ffmpeg::check_available(ffmpeg_path)
}
