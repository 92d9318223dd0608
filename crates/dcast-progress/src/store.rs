//! The progress store port.

use async_trait::async_trait;

use dcast_models::{JobId, JobProgress, ProgressPatch};

/// Keyed record of job progress.
///
/// `set` merges partial fields into the existing record, creating one
/// when absent, and stamps the update time. Records are never evicted
/// automatically; `clear` exists for callers that want to drop one.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Merge a partial update into the record for `job_id`.
    async fn set(&self, job_id: &JobId, patch: ProgressPatch);

    /// Current record for `job_id`, if any.
    async fn get(&self, job_id: &JobId) -> Option<JobProgress>;

    /// Remove the record for `job_id`.
    async fn clear(&self, job_id: &JobId);
}
