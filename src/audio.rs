//! Audio track probing

use crate::encoder::ffmpeg::find_ffprobe;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Audio resource anchoring the end of the timeline
#[derive(Debug, Clone)]
pub struct AudioTrack {
    /// Source file
    pub path: PathBuf,
    /// Total duration in seconds
    pub duration: f64,
    /// Codec of the first audio stream, as reported by ffprobe
    pub codec: Option<String>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

impl AudioTrack {
    /// Probe an audio file for its duration
    pub fn probe<P: AsRef<Path>>(path: P, ffmpeg_path: Option<&Path>) -> Result<Self> {
        let path = path.as_ref();
        let audio_error = |reason: String| Error::AudioLoad {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(audio_error("file not found".to_string()));
        }

        let ffprobe = find_ffprobe(ffmpeg_path)?;
        let output = Command::new(&ffprobe)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| audio_error(format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(audio_error(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let track = Self::from_probe_json(path, &output.stdout)?;
        tracing::info!(
            path = %path.display(),
            duration = track.duration,
            codec = ?track.codec,
            "audio probed"
        );
        Ok(track)
    }

    /// Interpret ffprobe JSON output
    pub fn from_probe_json(path: &Path, json: &[u8]) -> Result<Self> {
        let audio_error = |reason: String| Error::AudioLoad {
            path: path.to_path_buf(),
            reason,
        };

        let parsed: ProbeOut = serde_json::from_slice(json)
            .map_err(|e| audio_error(format!("unreadable ffprobe output: {}", e)))?;

        let stream = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("audio"))
            .ok_or_else(|| audio_error("no audio stream".to_string()))?;

        let parse = |s: &Option<String>| {
            s.as_deref()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|d| d.is_finite() && *d > 0.0)
        };

        let duration = parsed
            .format
            .as_ref()
            .and_then(|f| parse(&f.duration))
            .or_else(|| parse(&stream.duration))
            .ok_or_else(|| audio_error("duration unavailable".to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            duration,
            codec: stream.codec_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_json_format_duration() {
        let json = br#"{
            "streams": [
                {"codec_type": "video", "codec_name": "mjpeg"},
                {"codec_type": "audio", "codec_name": "mp3", "duration": "89.9"}
            ],
            "format": {"duration": "90.024000"}
        }"#;
        let track = AudioTrack::from_probe_json(Path::new("talk.mp3"), json).unwrap();
        assert!((track.duration - 90.024).abs() < 1e-9);
        assert_eq!(track.codec.as_deref(), Some("mp3"));
    }

    #[test]
    fn test_probe_json_stream_duration_fallback() {
        let json = br#"{"streams": [{"codec_type": "audio", "duration": "12.5"}], "format": {}}"#;
        let track = AudioTrack::from_probe_json(Path::new("a.wav"), json).unwrap();
        assert_eq!(track.duration, 12.5);
    }

    #[test]
    fn test_probe_json_without_audio() {
        let json = br#"{"streams": [{"codec_type": "video"}], "format": {"duration": "3.0"}}"#;
        let result = AudioTrack::from_probe_json(Path::new("clip.mp4"), json);
        assert!(matches!(result, Err(Error::AudioLoad { .. })));
    }

    #[test]
    fn test_probe_json_without_duration() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "N/A"}}"#;
        let result = AudioTrack::from_probe_json(Path::new("a.ogg"), json);
        assert!(matches!(result, Err(Error::AudioLoad { .. })));
    }

    #[test]
    fn test_probe_missing_file() {
        let result = AudioTrack::probe("/nonexistent/audio.mp3", None);
        assert!(matches!(result, Err(Error::AudioLoad { .. })));
    }
}
