//! Parsing time tokens out of FFmpeg diagnostic output.

use regex::Regex;
use std::sync::LazyLock;

/// Clock value of the form `HH:MM:SS[.frac]`.
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,3}):([0-9]{1,2}):([0-9]{1,2}(?:\.[0-9]+)?)").unwrap()
});

/// `time=` token on an encoder status line.
static TIME_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"time=([0-9:.]+)").unwrap());

/// Parse an `HH:MM:SS[.frac]` clock value to seconds.
pub fn parse_clock_duration(s: &str) -> Option<f64> {
    let caps = CLOCK_RE.captures(s)?;
    let hh = caps[1].parse::<i64>().unwrap_or(0) as f64;
    let mm = caps[2].parse::<i64>().unwrap_or(0) as f64;
    let ss = caps[3].parse::<f64>().unwrap_or(0.0);
    Some(hh * 3600.0 + mm * 60.0 + ss)
}

/// Scan a diagnostic chunk for a `time=` token and return elapsed seconds.
///
/// Accepts `HH:MM:SS[.frac]`, `MM:SS[.frac]` and bare `SS[.frac]` forms.
pub fn parse_time_token(chunk: &str) -> Option<f64> {
    let caps = TIME_TOKEN_RE.captures(chunk)?;
    let token = &caps[1];
    let parts: Vec<&str> = token.split(':').collect();

    let sec = match parts.as_slice() {
        [hh, mm, ss] => {
            hh.parse::<i64>().unwrap_or(0) as f64 * 3600.0
                + mm.parse::<i64>().unwrap_or(0) as f64 * 60.0
                + ss.parse::<f64>().unwrap_or(0.0)
        }
        [mm, ss] => {
            mm.parse::<i64>().unwrap_or(0) as f64 * 60.0 + ss.parse::<f64>().unwrap_or(0.0)
        }
        [ss] => ss.parse::<f64>().ok()?,
        _ => return None,
    };

    sec.is_finite().then_some(sec)
}
