//! Slide duration derivation

use crate::timing::TimingTable;
use crate::{Error, Result};

/// Shortest on-screen time for any slide, in seconds
pub const MIN_SLIDE_DURATION: f64 = 0.01;

/// Display duration of each slide, in table order
///
/// Each slide lasts until the next one starts. The last slide lasts until the
/// end of the audio plus `end_padding`. Every duration is floored at
/// [`MIN_SLIDE_DURATION`].
pub fn derive_durations(starts: &[f64], audio_duration: f64, end_padding: f64) -> Vec<f64> {
    let Some(&last) = starts.last() else {
        return Vec::new();
    };

    starts
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .chain(std::iter::once(audio_duration - last + end_padding))
        .map(|d| d.max(MIN_SLIDE_DURATION))
        .collect()
}

/// Length of the composed output: never shorter than the audio plus padding
pub fn final_duration(durations: &[f64], audio_duration: f64, end_padding: f64) -> f64 {
    let visual: f64 = durations.iter().sum();
    visual.max(audio_duration + end_padding)
}

/// Per-slide timing derived from a validated table
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Display duration per slide, in table order
    pub durations: Vec<f64>,
    /// Duration of the whole composition
    pub total_duration: f64,
}

impl Schedule {
    pub fn new(table: &TimingTable, audio_duration: f64, end_padding: f64) -> Result<Self> {
        if !audio_duration.is_finite() || audio_duration < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Audio duration must be non-negative, got {}",
                audio_duration
            )));
        }

        let durations = derive_durations(&table.start_times(), audio_duration, end_padding);
        let total_duration = final_duration(&durations, audio_duration, end_padding);

        Ok(Self {
            durations,
            total_duration,
        })
    }
}
