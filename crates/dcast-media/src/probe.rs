//! Source duration probing.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::timecode::parse_clock_duration;

/// Determine source duration in seconds.
///
/// Prefers ffprobe when a path for it is supplied; otherwise (or when
/// ffprobe yields nothing usable) spawns the encoder in a null-output
/// pass and parses the `Duration:` banner from its diagnostics. Returns
/// `None` when no positive duration could be determined. Never fails:
/// a missing duration only degrades progress precision.
pub async fn probe_duration(
    input: &Path,
    ffmpeg: &Path,
    ffprobe: Option<&Path>,
) -> Option<f64> {
    if let Some(ffprobe) = ffprobe {
        if let Some(duration) = probe_with_ffprobe(input, ffprobe).await {
            return Some(duration);
        }
    }
    probe_with_ffmpeg(input, ffmpeg).await
}

async fn probe_with_ffprobe(input: &Path, ffprobe: &Path) -> Option<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .ok()?;

    let text = String::from_utf8_lossy(&output.stdout);
    let duration = text.trim().parse::<f64>().ok()?;
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

async fn probe_with_ffmpeg(input: &Path, ffmpeg: &Path) -> Option<f64> {
    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-i")
        .arg(input)
        .args(["-f", "null", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .ok()?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    let line = stderr.lines().find(|l| l.contains("Duration:"))?;
    let duration = parse_clock_duration(line)?;
    if duration > 0.0 {
        Some(duration)
    } else {
        debug!("ffmpeg reported a non-positive duration for {}", input.display());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_probe_tolerates_missing_tools() {
        let input = PathBuf::from("/nonexistent/clip.mp4");
        let ffmpeg = PathBuf::from("/nonexistent/ffmpeg");
        let ffprobe = PathBuf::from("/nonexistent/ffprobe");

        let duration = probe_duration(&input, &ffmpeg, Some(&ffprobe)).await;
        assert_eq!(duration, None);
    }

    #[tokio::test]
    async fn test_probe_without_ffprobe_path() {
        let input = PathBuf::from("/nonexistent/clip.mp4");
        let ffmpeg = PathBuf::from("/nonexistent/ffmpeg");

        assert_eq!(probe_duration(&input, &ffmpeg, None).await, None);
    }
}
