use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use slidesync::{EncodeOptions, Job, OutputSpec, Progress, Resolution, ValidationMode};
use tracing_subscriber::EnvFilter;

/// Build an MP4 from slide images timed against an audio track.
#[derive(Parser, Debug)]
#[command(name = "slidesync", version)]
struct Cli {
    /// Audio file (mp3, wav, ...).
    #[arg(long, required_unless_present = "check")]
    audio: Option<PathBuf>,

    /// Timing table CSV with `filename` and `start_time` columns.
    #[arg(long, alias = "timing", required_unless_present = "check")]
    csv: Option<PathBuf>,

    /// Directory holding the slide images.
    #[arg(long, alias = "images_dir", required_unless_present = "check")]
    images_dir: Option<PathBuf>,

    /// Output MP4 path.
    #[arg(long, default_value = "out.mp4")]
    out: PathBuf,

    /// Output resolution as WxH.
    #[arg(long, default_value = "1920x1080", value_parser = slidesync::parse_resolution)]
    size: Resolution,

    /// Frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seconds to keep showing the last slide after the audio ends.
    #[arg(long, alias = "end_padding", default_value_t = 0.0)]
    end_padding: f64,

    /// Reject timing tables where two slides share a start time.
    #[arg(long)]
    strict: bool,

    /// Encoder threads.
    #[arg(long, default_value_t = 4)]
    threads: u32,

    /// x264 preset.
    #[arg(long, default_value = "medium")]
    preset: String,

    /// x264 constant rate factor (0-51).
    #[arg(long, default_value_t = 23)]
    crf: u8,

    /// Path to the ffmpeg executable (ffprobe is expected next to it).
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Only check that ffmpeg can encode H.264 and AAC, then exit.
    #[arg(long)]
    check: bool,

    /// More logging (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.check {
        slidesync::available(cli.ffmpeg.as_deref())?;
        println!("ffmpeg is ready (libx264 + aac)");
        return Ok(());
    }

    let (Some(audio), Some(csv), Some(images_dir)) = (cli.audio, cli.csv, cli.images_dir) else {
        anyhow::bail!("--audio, --csv and --images-dir are required");
    };

    let job = Job {
        audio,
        timing_table: csv,
        images_dir,
        output: cli.out,
        spec: OutputSpec {
            resolution: cli.size,
            fps: cli.fps,
            end_padding: cli.end_padding,
            encode: EncodeOptions {
                preset: cli.preset,
                crf: cli.crf,
                threads: cli.threads,
                ffmpeg_path: cli.ffmpeg,
                ..Default::default()
            },
        },
        mode: if cli.strict {
            ValidationMode::Strict
        } else {
            ValidationMode::Lenient
        },
    };

    let summary = slidesync::sync_with_progress(&job, report)
        .with_context(|| format!("failed to build '{}'", job.output.display()))?;

    println!(
        "Done: {} ({} slides, {:.2}s)",
        summary.output.display(),
        summary.slides,
        summary.encoded_duration
    );
    Ok(())
}

fn report(progress: Progress) {
    match progress {
        Progress::Validated { slides } => tracing::info!(slides, "timing table ok"),
        Progress::AudioProbed { duration } => tracing::info!(duration, "audio loaded"),
        Progress::Rendering { done, total } => tracing::info!("rendering slide {done}/{total}"),
        Progress::Finalizing => tracing::info!("finalizing mp4"),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
