//! Pipeline metrics collection.
//!
//! Provides standardized metrics for transcode jobs:
//! - Job counters by outcome
//! - Job, per-rendition encode, and per-rendition publish duration histograms
//! - Staged upload size histogram

use std::time::Duration;

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total transcode jobs by outcome (`started`, `done`, `error`).
    pub const JOBS_TOTAL: &str = "transcode_jobs_total";

    /// End-to-end job duration in seconds by outcome.
    pub const JOB_SECONDS: &str = "transcode_job_seconds";

    /// Per-rendition encode duration in seconds.
    pub const RENDITION_SECONDS: &str = "transcode_rendition_seconds";

    /// Per-rendition publish duration in seconds.
    pub const PUBLISH_SECONDS: &str = "transcode_publish_seconds";

    /// Bytes staged to disk per upload.
    pub const STAGED_BYTES: &str = "transcode_staged_bytes";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record a job accepted for background processing.
pub fn record_job_started() {
    counter!(names::JOBS_TOTAL, "outcome" => "started").increment(1);
}

/// Record a job reaching a terminal state.
pub fn record_job_finished(outcome: &'static str, elapsed: Duration) {
    counter!(names::JOBS_TOTAL, "outcome" => outcome).increment(1);

    histogram!(names::JOB_SECONDS, "outcome" => outcome).record(elapsed.as_secs_f64());
}

/// Record one rendition encoded successfully.
pub fn record_rendition_encoded(rendition: &'static str, elapsed: Duration) {
    histogram!(names::RENDITION_SECONDS, "rendition" => rendition).record(elapsed.as_secs_f64());
}

/// Record one rendition published to the storage backend.
pub fn record_rendition_published(rendition: &'static str, elapsed: Duration) {
    histogram!(names::PUBLISH_SECONDS, "rendition" => rendition).record(elapsed.as_secs_f64());
}

/// Record the size of a staged upload.
pub fn record_staged_bytes(bytes: u64) {
    histogram!(names::STAGED_BYTES).record(bytes as f64);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::JOBS_TOTAL.contains("jobs"));
        assert!(names::JOB_SECONDS.contains("seconds"));
        assert!(names::RENDITION_SECONDS.contains("rendition"));
        assert!(names::PUBLISH_SECONDS.contains("publish"));
        assert!(names::STAGED_BYTES.contains("staged"));
    }
}
