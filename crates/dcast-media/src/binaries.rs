//! Locating and preflighting the external media binaries.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

/// How long a `-version` preflight may take before the binary is
/// considered unrunnable.
const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(4);

/// Resolve the ffmpeg binary path.
///
/// An `FFMPEG_PATH` override wins when it points at an existing file;
/// otherwise the bare name is left for PATH lookup at spawn time.
pub fn ffmpeg_path() -> PathBuf {
    resolve("FFMPEG_PATH", "ffmpeg")
}

/// Resolve the ffprobe binary path, honoring `FFPROBE_PATH`.
pub fn ffprobe_path() -> PathBuf {
    resolve("FFPROBE_PATH", "ffprobe")
}

fn resolve(env_var: &str, default: &str) -> PathBuf {
    if let Some(path) = std::env::var(env_var).ok().map(PathBuf::from) {
        if path.exists() {
            return path;
        }
    }
    PathBuf::from(default)
}

/// Check that a binary exists and can actually run.
///
/// Spawns `<binary> -version` and waits for it to exit. Any exit status
/// counts as runnable; a spawn failure or a hang past the preflight
/// timeout does not.
pub async fn check_binary(path: &Path) -> bool {
    let child = Command::new(path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match child {
        Ok(child) => child,
        Err(e) => {
            debug!("preflight spawn of {} failed: {}", path.display(), e);
            return false;
        }
    };

    match tokio::time::timeout(PREFLIGHT_TIMEOUT, child.wait()).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("preflight wait for {} failed: {}", path.display(), e);
            false
        }
        Err(_) => {
            let _ = child.start_kill();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_binary_missing() {
        assert!(!check_binary(Path::new("/nonexistent/definitely-not-a-binary")).await);
    }

    #[tokio::test]
    async fn test_check_binary_rejects_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-executable");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        assert!(!check_binary(&path).await);
    }

    #[test]
    fn test_resolve_ignores_dangling_override() {
        std::env::set_var("DCAST_TEST_FFX", "/nonexistent/ffmpeg");
        assert_eq!(resolve("DCAST_TEST_FFX", "ffmpeg"), PathBuf::from("ffmpeg"));
        std::env::remove_var("DCAST_TEST_FFX");
    }

    #[test]
    fn test_resolve_takes_existing_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffmpeg-custom");
        std::fs::write(&path, b"").unwrap();
        std::env::set_var("DCAST_TEST_FFZ", &path);
        assert_eq!(resolve("DCAST_TEST_FFZ", "ffmpeg"), path);
        std::env::remove_var("DCAST_TEST_FFZ");
    }

    #[test]
    fn test_resolve_default_without_override() {
        std::env::remove_var("DCAST_TEST_FFY");
        assert_eq!(resolve("DCAST_TEST_FFY", "ffprobe"), PathBuf::from("ffprobe"));
    }
}
