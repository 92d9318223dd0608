//! FFmpeg CLI wrapper for the transcode pipeline.
//!
//! This crate provides:
//! - Binary resolution with environment overrides and preflight checks
//! - Type-safe FFmpeg command building
//! - An [`Encoder`] port whose FFmpeg implementation streams elapsed-time
//!   checkpoints out of the diagnostic output
//! - Duration probing via ffprobe with an ffmpeg fallback

pub mod binaries;
pub mod command;
pub mod encoder;
pub mod error;
pub mod probe;
pub mod timecode;

pub use binaries::{check_binary, ffmpeg_path, ffprobe_path};
pub use command::FfmpegCommand;
pub use encoder::{CheckpointFn, Encoder, FfmpegEncoder};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use timecode::{parse_clock_duration, parse_time_token};
