//! Start time parsing
//!
//! Accepted forms are `SS[.frac]`, `MM:SS[.frac]` and `HH:MM:SS[.frac]`.
//! Hours and minutes are unbounded, so `90:00` is ninety minutes.

use crate::{Error, Result};

/// Parse a start time string into seconds
pub fn parse_time_to_seconds(input: &str) -> Result<f64> {
    let s = input.trim();

    if let Some(seconds) = parse_decimal(s) {
        return Ok(seconds);
    }

    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let seconds = match parts.as_slice() {
        [h, m, sec] => parse_integer(h)
            .zip(parse_integer(m))
            .zip(parse_decimal(sec))
            .map(|((h, m), sec)| h * 3600.0 + m * 60.0 + sec),
        [m, sec] => parse_integer(m)
            .zip(parse_decimal(sec))
            .map(|(m, sec)| m * 60.0 + sec),
        [sec] => parse_decimal(sec),
        _ => None,
    };

    seconds.ok_or_else(|| Error::UnknownTimeFormat(input.to_string()))
}

/// Unsigned integer component (hours or minutes)
fn parse_integer(s: &str) -> Option<f64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok().map(|v| v as f64)
}

/// Unsigned decimal with an optional leading `+`: `5`, `5.25`, `.5` or `5.`
fn parse_decimal(s: &str) -> Option<f64> {
    let unsigned = s.strip_prefix('+').unwrap_or(s);
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(frac) || (whole.is_empty() && frac.is_empty()) {
        return None;
    }

    unsigned.parse::<f64>().ok().filter(|v| v.is_finite())
}
