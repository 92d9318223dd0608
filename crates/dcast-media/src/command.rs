//! FFmpeg command builder.

use std::path::{Path, PathBuf};

/// Builder for one FFmpeg invocation.
///
/// The default log level is kept so the status line (the source of
/// `time=` checkpoints) stays on the diagnostic stream.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.extend(self.input_args.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcast_models::{EncodeSettings, RENDITION_LADDER};

    #[test]
    fn test_command_builder() {
        let target = RENDITION_LADDER[0];
        let cmd = FfmpegCommand::new("input.mp4", "clip_1080p.mp4")
            .video_filter(target.scale_pad_filter())
            .output_args(EncodeSettings::default().to_output_args());

        let args = cmd.build_args();
        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "-i");
        assert_eq!(args[2], "input.mp4");
        assert_eq!(args[3], "-vf");
        assert!(args[4].starts_with("scale=1920:1080:"));
        assert!(args.contains(&"libx264".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("clip_1080p.mp4"));
    }

    #[test]
    fn test_no_progress_flags_injected() {
        let args = FfmpegCommand::new("a", "b").build_args();
        assert!(!args.contains(&"-progress".to_string()));
        assert!(!args.contains(&"-v".to_string()));
    }
}
