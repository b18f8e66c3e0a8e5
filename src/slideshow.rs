//! Slide sequencing
//!
//! Segments are written back to back with hard cuts. Frame boundaries are
//! placed at the rounded cumulative slide end times so rounding never
//! accumulates across slides.

use crate::encoder::{Encoder, Frame};
use crate::image_loader::LoadedImage;
use crate::{Error, Resolution, Result};
use std::path::{Path, PathBuf};

/// One slide, letterboxed and ready to be shown for a fixed duration
#[derive(Debug, Clone)]
pub struct SlideSegment {
    /// Image the frame was made from
    pub source_image: PathBuf,
    /// Seconds on screen
    pub duration_seconds: f64,
    /// Letterboxed frame at the output resolution
    pub frame: LoadedImage,
}

impl SlideSegment {
    /// Load, scale and letterbox a slide image
    pub fn compose<P: AsRef<Path>>(
        source: P,
        duration_seconds: f64,
        resolution: Resolution,
    ) -> Result<Self> {
        let source = source.as_ref();
        let frame = LoadedImage::from_path(source)?.letterbox(resolution)?;

        Ok(Self {
            source_image: source.to_path_buf(),
            duration_seconds,
            frame,
        })
    }
}

/// What the sequencer wrote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceSummary {
    /// Slides written
    pub segments: usize,
    /// Frames sent to the encoder
    pub frames: u64,
    /// Sum of slide durations in seconds
    pub visual_duration: f64,
    /// Length of the frame stream in seconds
    pub video_duration: f64,
}

/// Writes slide segments to an encoder as a continuous frame stream
pub struct Sequencer<'a> {
    encoder: &'a mut dyn Encoder,
    resolution: Resolution,
    fps: u32,
    frames_written: u64,
    elapsed: f64,
    segments: usize,
    last_frame: Option<LoadedImage>,
}

impl<'a> Sequencer<'a> {
    pub fn new(encoder: &'a mut dyn Encoder, resolution: Resolution, fps: u32) -> Self {
        Self {
            encoder,
            resolution,
            fps,
            frames_written: 0,
            elapsed: 0.0,
            segments: 0,
            last_frame: None,
        }
    }

    /// Append a segment; every segment gets at least one frame
    pub fn push(&mut self, segment: SlideSegment) -> Result<()> {
        let frame = segment.frame;
        if frame.width != self.resolution.width || frame.height != self.resolution.height {
            return Err(Error::InvalidInput(format!(
                "Segment {} is {}x{}, expected {}",
                segment.source_image.display(),
                frame.width,
                frame.height,
                self.resolution
            )));
        }

        self.elapsed += segment.duration_seconds;
        let count = segment_end(self.elapsed, self.frames_written, self.fps) - self.frames_written;

        tracing::debug!(
            source = %segment.source_image.display(),
            duration = segment.duration_seconds,
            frames = count,
            "segment"
        );

        self.write(&frame, count)?;
        self.segments += 1;
        self.last_frame = Some(frame);
        Ok(())
    }

    /// Hold the last slide until `total_duration` is covered, then close the encoder
    pub fn finish(mut self, total_duration: f64) -> Result<SequenceSummary> {
        let last = self
            .last_frame
            .take()
            .ok_or_else(|| Error::InvalidInput("No slides to encode".to_string()))?;

        let target = frames_for(total_duration, self.fps);
        if target > self.frames_written {
            let hold = target - self.frames_written;
            tracing::debug!(frames = hold, "holding last slide");
            self.write(&last, hold)?;
        }

        self.encoder.finish()?;

        Ok(SequenceSummary {
            segments: self.segments,
            frames: self.frames_written,
            visual_duration: self.elapsed,
            video_duration: self.frames_written as f64 / self.fps as f64,
        })
    }

    fn write(&mut self, image: &LoadedImage, count: u64) -> Result<()> {
        for _ in 0..count {
            let frame = Frame {
                width: image.width,
                height: image.height,
                data: &image.data,
                index: self.frames_written,
            };
            self.encoder.encode(&frame)?;
            self.frames_written += 1;
        }
        Ok(())
    }
}

/// Frames [`Sequencer`] writes for slides of `durations` followed by [`Sequencer::finish`]
/// with `total_duration`
///
/// Can exceed `total_duration * fps` when short slides are stretched to one frame.
pub fn planned_frames(durations: &[f64], total_duration: f64, fps: u32) -> u64 {
    let mut elapsed = 0.0;
    let mut frames = 0;
    for duration in durations {
        elapsed += duration;
        frames = segment_end(elapsed, frames, fps);
    }
    frames.max(frames_for(total_duration, fps))
}

/// Frame index where a segment ending at `elapsed` seconds stops, at least one past `written`
fn segment_end(elapsed: f64, written: u64, fps: u32) -> u64 {
    ((elapsed * fps as f64).round() as u64).max(written + 1)
}

/// Smallest frame count covering `seconds`
fn frames_for(seconds: f64, fps: u32) -> u64 {
    // Tolerate float noise so 2.0s at 30fps is 60 frames, not 61
    (seconds * fps as f64 - 1e-6).ceil().max(0.0) as u64
}
