//! Transcode job identity and the progress record polled by clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::file::PublishedFile;
use crate::rendition::RENDITION_LADDER;

/// Unique identifier for a transcode job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Source bytes are being staged to local disk
    #[default]
    Preparing,
    /// A rendition is being encoded
    Encoding,
    /// A finished rendition is being published
    Uploading,
    /// A rendition was published; the next one has not started yet
    Progress,
    /// All renditions published
    Done,
    /// Terminal failure
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Preparing => "preparing",
            JobStatus::Encoding => "encoding",
            JobStatus::Uploading => "uploading",
            JobStatus::Progress => "progress",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// The progress record for one job.
///
/// Exactly one record exists per job id. The orchestrator running the job
/// is its only writer; the polling endpoint returns it verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    /// Lifecycle status
    pub status: JobStatus,

    /// Label of the rendition currently being processed, null before
    /// the first rendition starts
    pub current: Option<String>,

    /// Renditions completed so far
    pub done: u32,

    /// Renditions in the ladder
    pub total: u32,

    /// Overall progress (0-100)
    pub percent: u8,

    /// Published renditions in ladder order, set only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PublishedFile>>,

    /// Failure message, set only on terminal error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobProgress {
    /// Initial record for a freshly accepted job.
    pub fn started() -> Self {
        Self {
            status: JobStatus::Preparing,
            current: None,
            done: 0,
            total: RENDITION_LADDER.len() as u32,
            percent: 0,
            files: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Merge a partial update into this record, stamping the update time.
    ///
    /// Fields absent from the patch keep their previous value.
    pub fn apply(&mut self, patch: ProgressPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(current) = patch.current {
            self.current = Some(current);
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(percent) = patch.percent {
            self.percent = percent;
        }
        if let Some(files) = patch.files {
            self.files = Some(files);
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update merged into a job's progress record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<PublishedFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressPatch {
    /// Start a patch from a status change.
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Terminal error patch.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_current(mut self, label: impl Into<String>) -> Self {
        self.current = Some(label.into());
        self
    }

    pub fn with_done(mut self, done: u32) -> Self {
        self.done = Some(done);
        self
    }

    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = Some(percent);
        self
    }

    pub fn with_files(mut self, files: Vec<PublishedFile>) -> Self {
        self.files = Some(files);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_record() {
        let record = JobProgress::started();
        assert_eq!(record.status, JobStatus::Preparing);
        assert_eq!(record.current, None);
        assert_eq!(record.done, 0);
        assert_eq!(record.total, 4);
        assert_eq!(record.percent, 0);
        assert!(record.files.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut record = JobProgress::started();
        record.apply(
            ProgressPatch::status(JobStatus::Encoding)
                .with_current("1080p")
                .with_done(0)
                .with_percent(0),
        );
        let before = record.updated_at;

        record.apply(ProgressPatch::default().with_percent(12));
        assert_eq!(record.status, JobStatus::Encoding);
        assert_eq!(record.current.as_deref(), Some("1080p"));
        assert_eq!(record.percent, 12);
        assert!(record.updated_at >= before);
    }

    #[test]
    fn test_error_patch_keeps_done_count() {
        let mut record = JobProgress::started();
        record.apply(
            ProgressPatch::status(JobStatus::Progress)
                .with_done(2)
                .with_percent(50),
        );
        record.apply(ProgressPatch::error("encoder exited with code 1"));

        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.done, 2);
        assert_eq!(
            record.error.as_deref(),
            Some("encoder exited with code 1")
        );
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Preparing).unwrap(),
            "\"preparing\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Done).unwrap(),
            "\"done\""
        );
    }

    #[test]
    fn test_record_wire_shape() {
        let record = JobProgress::started();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["status"], "preparing");
        assert!(json["current"].is_null());
        assert!(json.get("files").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(!JobStatus::Encoding.is_terminal());
        assert!(!JobStatus::Progress.is_terminal());
    }

    #[test]
    fn test_job_id_uniqueness() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
