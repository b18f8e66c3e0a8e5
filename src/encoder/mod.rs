//! Video encoders

pub mod ffmpeg;

use crate::{EncodeOptions, Resolution, Result};
use std::path::PathBuf;

/// Raw video frame in RGBA format
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// RGBA pixel data (width * height * 4 bytes)
    pub data: &'a [u8],
    /// Zero-based frame index in the output stream
    pub index: u64,
}

/// Video encoder trait
pub trait Encoder: Send {
    /// Encode a frame
    fn encode(&mut self, frame: &Frame<'_>) -> Result<()>;

    /// Flush remaining output and close the container
    fn finish(&mut self) -> Result<()>;
}

/// Encoder configuration
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Output frame size
    pub resolution: Resolution,
    /// Frame rate (frames per second)
    pub fps: u32,
    /// Audio track muxed into the output
    pub audio_path: PathBuf,
    /// Output duration in seconds; audio is padded with silence up to it
    pub duration: f64,
    /// Container file to write
    pub output_path: PathBuf,
    /// Codec parameters
    pub options: EncodeOptions,
}

/// Create the H.264/AAC encoder
pub fn create_encoder(config: EncoderConfig) -> Result<Box<dyn Encoder>> {
    Ok(Box::new(ffmpeg::FfmpegEncoder::new(config)?))
}
