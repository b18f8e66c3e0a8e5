//! End-to-end run: timing table and audio in, MP4 out

use crate::audio::AudioTrack;
use crate::encoder::{create_encoder, EncoderConfig};
use crate::muxer;
use crate::schedule::Schedule;
use crate::slideshow::{planned_frames, Sequencer, SlideSegment};
use crate::timing::{list_images, TimingTable};
use crate::{Error, OutputSpec, Result, ValidationMode};
use std::path::PathBuf;

/// One slideshow job on files on disk
#[derive(Debug, Clone)]
pub struct Job {
    /// Narration audio
    pub audio: PathBuf,
    /// CSV timing table
    pub timing_table: PathBuf,
    /// Directory holding the slide images
    pub images_dir: PathBuf,
    /// MP4 to write
    pub output: PathBuf,
    /// Output configuration
    pub spec: OutputSpec,
    /// Duplicate start time policy
    pub mode: ValidationMode,
}

impl Job {
    /// Job with default output settings
    pub fn new(
        audio: impl Into<PathBuf>,
        timing_table: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            audio: audio.into(),
            timing_table: timing_table.into(),
            images_dir: images_dir.into(),
            output: output.into(),
            spec: OutputSpec::default(),
            mode: ValidationMode::default(),
        }
    }
}

/// Pipeline progress, reported through the callback of [`sync_with_progress`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Timing table and images checked
    Validated { slides: usize },
    /// Audio duration known
    AudioProbed { duration: f64 },
    /// A slide has been rendered into the stream
    Rendering { done: usize, total: usize },
    /// All frames written, container being finalized
    Finalizing,
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Written MP4
    pub output: PathBuf,
    /// Slides in the timing table
    pub slides: usize,
    /// Video frames encoded
    pub frames: u64,
    /// Audio track duration in seconds
    pub audio_duration: f64,
    /// `max(sum of slide durations, audio + padding)`
    pub composed_duration: f64,
    /// Duration reported by the written container
    pub encoded_duration: f64,
}

/// Run a job
pub fn sync(job: &Job) -> Result<RunSummary> {
    sync_with_progress(job, |_| {})
}

/// Run a job, reporting progress
///
/// The output file only appears once it has been fully written and checked;
/// on any failure nothing is left at `job.output`.
#[tracing::instrument(skip_all, fields(output = %job.output.display()))]
pub fn sync_with_progress<F: FnMut(Progress)>(job: &Job, mut progress: F) -> Result<RunSummary> {
    let spec = &job.spec;
    spec.validate()?;

    let table = TimingTable::from_path(&job.timing_table, job.mode)?;
    let images = list_images(&job.images_dir)?;
    table.require_images(&images)?;
    tracing::info!(slides = table.len(), "timing table validated");
    progress(Progress::Validated {
        slides: table.len(),
    });

    let audio = AudioTrack::probe(&job.audio, spec.encode.ffmpeg_path.as_deref())?;
    progress(Progress::AudioProbed {
        duration: audio.duration,
    });

    let schedule = Schedule::new(&table, audio.duration, spec.end_padding)?;
    if let Some(first) = table.rows().first() {
        if first.start_seconds > 0.0 {
            tracing::warn!(
                start = first.start_seconds,
                "first slide starts after 0s; it is shown from the beginning of the video"
            );
        }
    }

    let parent = match job.output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| Error::file_access(&parent, e))?;

    // Staged beside the destination so the final rename stays on one filesystem
    let staging_dir = tempfile::Builder::new()
        .prefix(".slidesync-")
        .tempdir_in(&parent)
        .map_err(|e| Error::file_access(&parent, e))?;
    let staging = staging_dir.path().join("out.mp4");

    let mut encoder = create_encoder(encoder_config(
        spec,
        &schedule,
        audio.path.clone(),
        staging.clone(),
    ))?;

    let total = table.len();
    let mut sequencer = Sequencer::new(&mut *encoder, spec.resolution, spec.fps);
    for (index, (row, duration)) in table.rows().iter().zip(&schedule.durations).enumerate() {
        let segment = SlideSegment::compose(
            job.images_dir.join(&row.filename),
            *duration,
            spec.resolution,
        )?;
        sequencer.push(segment)?;
        progress(Progress::Rendering {
            done: index + 1,
            total,
        });
    }

    progress(Progress::Finalizing);
    let sequence = sequencer.finish(schedule.total_duration)?;
    drop(encoder);

    let info = muxer::mp4::inspect(&staging)?;
    info.verify()?;

    std::fs::rename(&staging, &job.output).map_err(|e| {
        Error::Encoding(format!(
            "Failed to move output into place at {}: {}",
            job.output.display(),
            e
        ))
    })?;

    tracing::info!(
        frames = sequence.frames,
        duration = info.duration,
        "video written"
    );

    Ok(RunSummary {
        output: job.output.clone(),
        slides: total,
        frames: sequence.frames,
        audio_duration: audio.duration,
        composed_duration: schedule.total_duration,
        encoded_duration: info.duration,
    })
}

/// Encoder settings for a schedule
///
/// The stream is cut no earlier than the last planned frame, so slides
/// stretched to a single frame at the end of the table are kept.
fn encoder_config(
    spec: &OutputSpec,
    schedule: &Schedule,
    audio_path: PathBuf,
    output_path: PathBuf,
) -> EncoderConfig {
    let frames = planned_frames(&schedule.durations, schedule.total_duration, spec.fps);
    let duration = schedule
        .total_duration
        .max(frames as f64 / spec.fps as f64);

    EncoderConfig {
        resolution: spec.resolution,
        fps: spec.fps,
        audio_path,
        duration,
        output_path,
        options: spec.encode.clone(),
    }
}
