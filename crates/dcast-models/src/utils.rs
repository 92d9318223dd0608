//! Utility functions shared across the backend crates.

use url::Url;

/// File extensions treated as video regardless of declared media type.
const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mkv", "mov", "webm", "avi", "m4v"];

/// Decide whether an upload should go through the transcode pipeline.
///
/// True when the declared media type starts with `video/` or the file
/// name carries a recognized video extension.
pub fn is_video_source(media_type: &str, file_name: &str) -> bool {
    if media_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("video/")
    {
        return true;
    }
    match file_name.rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS
            .iter()
            .any(|v| ext.eq_ignore_ascii_case(v)),
        None => false,
    }
}

/// Extract a Drive file id from a share URL or a bare id.
///
/// Accepts:
/// - bare ids (20+ characters of [A-Za-z0-9_-])
/// - `https://drive.google.com/file/d/<id>/view` style paths
/// - URLs carrying an `id` query parameter
pub fn extract_drive_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.len() >= 20
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Some(input.to_string());
    }

    let url = Url::parse(input).ok()?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if let Some(pos) = segments.iter().position(|s| *s == "file") {
        if segments.get(pos + 1).copied() == Some("d") {
            if let Some(id) = segments.get(pos + 2) {
                return Some((*id).to_string());
            }
        }
    }

    url.query_pairs()
        .find(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_by_media_type() {
        assert!(is_video_source("video/mp4", "anything.bin"));
        assert!(is_video_source("VIDEO/QUICKTIME", "x"));
        assert!(!is_video_source("text/plain", "notes.txt"));
    }

    #[test]
    fn test_video_by_extension() {
        assert!(is_video_source("application/octet-stream", "clip.mkv"));
        assert!(is_video_source("application/octet-stream", "CLIP.MP4"));
        assert!(is_video_source("", "movie.m4v"));
        assert!(!is_video_source("application/octet-stream", "clip.mp3"));
        assert!(!is_video_source("application/octet-stream", "mp4"));
        assert!(!is_video_source("application/octet-stream", "archive.mp4.txt"));
    }

    #[test]
    fn test_extract_bare_id() {
        assert_eq!(
            extract_drive_id("1aBcD2eFgH3iJkL4mNoP5qRsT"),
            Some("1aBcD2eFgH3iJkL4mNoP5qRsT".to_string())
        );
        // Too short to be trusted as a bare id
        assert_eq!(extract_drive_id("abc123"), None);
    }

    #[test]
    fn test_extract_from_file_path() {
        assert_eq!(
            extract_drive_id("https://drive.google.com/file/d/1aBcD2eFgH3iJkL/view?usp=sharing"),
            Some("1aBcD2eFgH3iJkL".to_string())
        );
    }

    #[test]
    fn test_extract_from_query() {
        assert_eq!(
            extract_drive_id("https://drive.google.com/open?id=1aBcD2eFgH3iJkL"),
            Some("1aBcD2eFgH3iJkL".to_string())
        );
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert_eq!(extract_drive_id(""), None);
        assert_eq!(extract_drive_id("not a url"), None);
        assert_eq!(
            extract_drive_id("https://drive.google.com/drive/folders"),
            None
        );
    }
}
