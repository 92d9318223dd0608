//! The fixed rendition ladder and encode settings.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset
pub const DEFAULT_PRESET: &str = "veryfast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// One rung of the rendition ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionTarget {
    /// Display label, e.g. "720p"
    pub label: &'static str,
    /// Target frame width in pixels
    pub width: u32,
    /// Target frame height in pixels
    pub height: u32,
}

impl RenditionTarget {
    /// Output file name for a given source base name.
    pub fn output_name(&self, base_name: &str) -> String {
        format!("{}_{}p.mp4", base_name, self.height)
    }

    /// Filter expression that scales into the target box preserving
    /// aspect ratio, then pads to the exact dimensions with black bars.
    pub fn scale_pad_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black",
            w = self.width,
            h = self.height
        )
    }
}

/// Every video job renders these four targets, highest resolution first.
pub const RENDITION_LADDER: [RenditionTarget; 4] = [
    RenditionTarget {
        label: "1080p",
        width: 1920,
        height: 1080,
    },
    RenditionTarget {
        label: "720p",
        width: 1280,
        height: 720,
    },
    RenditionTarget {
        label: "480p",
        width: 854,
        height: 480,
    },
    RenditionTarget {
        label: "360p",
        width: 640,
        height: 360,
    },
];

/// Video encode settings shared by every rendition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeSettings {
    /// Video codec
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl EncodeSettings {
    /// Output-side FFmpeg arguments, ending with fast-start metadata
    /// placement for progressive playback.
    pub fn to_output_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_order() {
        let heights: Vec<u32> = RENDITION_LADDER.iter().map(|t| t.height).collect();
        assert_eq!(heights, vec![1080, 720, 480, 360]);
    }

    #[test]
    fn test_output_name() {
        let target = RENDITION_LADDER[1];
        assert_eq!(target.output_name("clip"), "clip_720p.mp4");
    }

    #[test]
    fn test_scale_pad_filter() {
        let filter = RENDITION_LADDER[0].scale_pad_filter();
        assert_eq!(
            filter,
            "scale=1920:1080:force_original_aspect_ratio=decrease,pad=1920:1080:(ow-iw)/2:(oh-ih)/2:black"
        );
    }

    #[test]
    fn test_default_output_args() {
        let args = EncodeSettings::default().to_output_args();
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"veryfast".to_string()));
        assert!(args.contains(&"23".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
    }
}
