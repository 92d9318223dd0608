//! Shared data models for the Drivecast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Transcode jobs and their progress records
//! - The rendition ladder and encode settings
//! - Drive file metadata and API response shapes

pub mod file;
pub mod job;
pub mod rendition;
pub mod utils;

// Re-export common types
pub use file::{DriveFile, FileCapabilities, FileList, PublishedFile, FOLDER_MIME_TYPE};
pub use job::{JobId, JobProgress, JobStatus, ProgressPatch};
pub use rendition::{EncodeSettings, RenditionTarget, RENDITION_LADDER};
pub use utils::{extract_drive_id, is_video_source};
