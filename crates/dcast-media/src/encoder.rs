//! The encoder port and its FFmpeg implementation.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::binaries;
use crate::error::{MediaError, MediaResult};
use crate::timecode::parse_time_token;

/// Diagnostic excerpt carried by a failed run, in characters.
const STDERR_EXCERPT_CHARS: usize = 4000;

/// Callback receiving elapsed source seconds while a transcode runs.
pub type CheckpointFn = Box<dyn Fn(f64) + Send + 'static>;

/// Runs one transcode to completion, surfacing elapsed-time checkpoints.
///
/// Implementations must resolve on exit status 0 and reject otherwise,
/// carrying a bounded excerpt of the diagnostic output. Retry policy
/// does not belong at this layer.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Cheap preflight: does the underlying tool exist and run at all?
    async fn check(&self) -> bool;

    /// Run the encoder with the given argument list.
    async fn run(&self, args: &[String], on_checkpoint: CheckpointFn) -> MediaResult<()>;

    /// Human-readable location of the underlying tool, for error messages.
    fn location(&self) -> String;
}

/// [`Encoder`] backed by the ffmpeg CLI.
pub struct FfmpegEncoder {
    path: PathBuf,
}

impl FfmpegEncoder {
    /// Use a specific ffmpeg binary.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve the binary from `FFMPEG_PATH` or PATH.
    pub fn from_env() -> Self {
        Self::new(binaries::ffmpeg_path())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn check(&self) -> bool {
        binaries::check_binary(&self.path).await
    }

    async fn run(&self, args: &[String], on_checkpoint: CheckpointFn) -> MediaResult<()> {
        which::which(&self.path)
            .map_err(|_| MediaError::encoder_unavailable(self.path.to_string_lossy()))?;

        debug!("running {} {}", self.path.display(), args.join(" "));

        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // The status line ffmpeg rewrites during a run is chunked, not
        // newline-terminated, so read raw chunks rather than lines.
        let mut captured = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            let mut buf = [0u8; 8192];
            loop {
                let n = stderr.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                let chunk = String::from_utf8_lossy(&buf[..n]);
                if let Some(sec) = parse_time_token(&chunk) {
                    on_checkpoint(sec);
                }
                captured.push_str(&chunk);
            }
        }

        let status = child.wait().await?;
        if status.success() {
            return Ok(());
        }

        let code = status.code();
        let code_str = code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string());
        let excerpt: String = captured.chars().take(STDERR_EXCERPT_CHARS).collect();

        Err(MediaError::encoder_failed(
            format!("ffmpeg exited with code {}: {}", code_str, excerpt),
            excerpt.clone(),
            code,
        ))
    }

    fn location(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_missing_binary() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg-missing");
        let err = encoder
            .run(&["-y".to_string()], Box::new(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::EncoderUnavailable { .. }));
        assert!(err.to_string().contains("FFMPEG_PATH"));
    }

    #[tokio::test]
    async fn test_check_missing_binary() {
        let encoder = FfmpegEncoder::new("/nonexistent/ffmpeg-missing");
        assert!(!encoder.check().await);
    }

    #[test]
    fn test_location_reports_path() {
        let encoder = FfmpegEncoder::new("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(encoder.location(), "/opt/ffmpeg/bin/ffmpeg");
    }
}
