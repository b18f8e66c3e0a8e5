//! H.264/AAC encoder using an ffmpeg external process
//!
//! Frames are piped to ffmpeg as raw RGBA. The audio track is read by ffmpeg
//! directly, padded with silence and cut to the configured duration.

use super::{Encoder, EncoderConfig, Frame};
use crate::{Error, Result};
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

type StderrDrain = JoinHandle<std::io::Result<Vec<u8>>>;

/// FFmpeg-based H.264/AAC MP4 encoder
pub struct FfmpegEncoder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<StderrDrain>,
    config: EncoderConfig,
    frame_count: u64,
}

impl FfmpegEncoder {
    pub fn new(config: EncoderConfig) -> Result<Self> {
        let ffmpeg = find_ffmpeg(config.options.ffmpeg_path.as_deref())?;
        let args = command_args(&config);
        tracing::debug!(ffmpeg = %ffmpeg.display(), ?args, "spawning encoder");

        let mut child = Command::new(&ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Encoding(format!("Failed to start ffmpeg: {}", e)))?;

        let stdin = child.stdin.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut bytes = Vec::new();
                stderr.read_to_end(&mut bytes)?;
                Ok(bytes)
            })
        });

        Ok(Self {
            child: Some(child),
            stdin,
            stderr_drain,
            config,
            frame_count: 0,
        })
    }

    /// Wait for ffmpeg to exit and fail with its diagnostics if it did not succeed
    fn wait(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Err(Error::Encoding("Encoder already finished".to_string()));
        };

        let status = child
            .wait()
            .map_err(|e| Error::Encoding(format!("FFmpeg process error: {}", e)))?;

        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::Encoding("FFmpeg stderr reader panicked".to_string()))?
                .unwrap_or_default(),
            None => Vec::new(),
        };

        if status.success() {
            Ok(())
        } else {
            Err(Error::Encoding(format!(
                "ffmpeg exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )))
        }
    }
}

impl Encoder for FfmpegEncoder {
    fn encode(&mut self, frame: &Frame<'_>) -> Result<()> {
        let expected = self.config.resolution;
        if frame.width != expected.width || frame.height != expected.height {
            return Err(Error::Encoding(format!(
                "Frame size mismatch: got {}x{}, expected {}",
                frame.width, frame.height, expected
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Encoding("FFmpeg stdin not available".to_string()))?;

        if let Err(e) = stdin.write_all(frame.data) {
            // A broken pipe means ffmpeg quit; its exit status explains why
            drop(self.stdin.take());
            self.wait()?;
            return Err(Error::Encoding(format!("Failed to write frame: {}", e)));
        }

        self.frame_count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Close stdin to signal end of input
        drop(self.stdin.take());
        self.wait()?;
        tracing::debug!(frames = self.frame_count, "encoder finished");
        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Kill the process if it's still running
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

/// ffmpeg arguments for a raw-RGBA-plus-audio to MP4 encode
pub fn command_args(config: &EncoderConfig) -> Vec<OsString> {
    let options = &config.options;
    let mut args: Vec<OsString> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
        &config.resolution.to_string(),
        "-r",
        &config.fps.to_string(),
        "-i",
        "pipe:0",
        "-i",
    ]
    .iter()
    .map(OsString::from)
    .collect();

    args.push(config.audio_path.clone().into_os_string());

    args.extend(
        [
            "-map",
            "0:v:0",
            "-map",
            "1:a:0",
            "-c:v",
            "libx264",
            "-preset",
            &options.preset,
            "-crf",
            &options.crf.to_string(),
            "-pix_fmt",
            "yuv420p",
            "-r",
            &config.fps.to_string(),
            "-c:a",
            "aac",
            "-b:a",
            &options.audio_bitrate,
            "-af",
            "apad",
            "-t",
            &duration_arg(config.duration),
            "-threads",
            &options.threads.to_string(),
            "-movflags",
            "+faststart",
            "-f",
            "mp4",
        ]
        .iter()
        .map(OsString::from),
    );

    args.push(config.output_path.clone().into_os_string());
    args
}

/// `-t` value in whole milliseconds, rounded up so the cut never lands before `seconds`
fn duration_arg(seconds: f64) -> String {
    // Tolerate float noise so 75.01 stays 75.010
    let millis = (seconds * 1000.0 - 1e-6).ceil().max(0.0);
    format!("{:.3}", millis / 1000.0)
}

/// Find ffmpeg executable
pub fn find_ffmpeg(custom_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = custom_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(Error::ToolUnavailable(format!(
            "FFmpeg not found at: {}",
            path.display()
        )));
    }

    find_on_path("ffmpeg")
}

/// Find ffprobe, next to a custom ffmpeg when one is given
pub fn find_ffprobe(ffmpeg_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(ffmpeg) = ffmpeg_path {
        let mut sibling = ffmpeg.with_file_name("ffprobe");
        if let Some(ext) = ffmpeg.extension() {
            sibling.set_extension(ext);
        }
        if sibling.exists() {
            return Ok(sibling);
        }
        return Err(Error::ToolUnavailable(format!(
            "FFprobe not found at: {}",
            sibling.display()
        )));
    }

    find_on_path("ffprobe")
}

fn find_on_path(tool: &str) -> Result<PathBuf> {
    let candidates = [
        PathBuf::from(tool),
        Path::new("/usr/bin").join(tool),
        Path::new("/usr/local/bin").join(tool),
        Path::new("/opt/homebrew/bin").join(tool),
    ];

    for path in candidates {
        if Command::new(&path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
        {
            return Ok(path);
        }
    }

    Err(Error::ToolUnavailable(format!("{} not found in PATH", tool)))
}

/// Check that ffmpeg and ffprobe are present and ffmpeg can encode H.264 and AAC
pub fn check_available(ffmpeg_path: Option<&Path>) -> Result<()> {
    let ffmpeg = find_ffmpeg(ffmpeg_path)?;
    find_ffprobe(ffmpeg_path)?;

    let output = Command::new(&ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .output()
        .map_err(|e| Error::ToolUnavailable(format!("Failed to run ffmpeg: {}", e)))?;

    let encoders = String::from_utf8_lossy(&output.stdout);
    let has_encoder = |name: &str| {
        encoders
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(name))
    };

    for name in ["libx264", "aac"] {
        if !has_encoder(name) {
            return Err(Error::ToolUnavailable(format!(
                "FFmpeg does not have {} support",
                name
            )));
        }
    }

    Ok(())
}
