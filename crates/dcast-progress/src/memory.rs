//! In-memory progress store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use dcast_models::{JobId, JobProgress, ProgressPatch};

use crate::store::ProgressStore;

/// Process-local [`ProgressStore`] over a concurrent map.
///
/// Cheap to clone; clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    records: Arc<DashMap<JobId, JobProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn set(&self, job_id: &JobId, patch: ProgressPatch) {
        self.records
            .entry(job_id.clone())
            .or_insert_with(JobProgress::started)
            .apply(patch);
    }

    async fn get(&self, job_id: &JobId) -> Option<JobProgress> {
        self.records.get(job_id).map(|record| record.clone())
    }

    async fn clear(&self, job_id: &JobId) {
        self.records.remove(job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcast_models::JobStatus;

    #[tokio::test]
    async fn test_set_creates_record() {
        let store = MemoryProgressStore::new();
        let id = JobId::new();

        store.set(&id, ProgressPatch::default()).await;

        let record = store.get(&id).await.expect("record should exist");
        assert_eq!(record.status, JobStatus::Preparing);
        assert_eq!(record.done, 0);
        assert_eq!(record.total, 4);
    }

    #[tokio::test]
    async fn test_set_merges_partial_fields() {
        let store = MemoryProgressStore::new();
        let id = JobId::new();

        store
            .set(
                &id,
                ProgressPatch::status(JobStatus::Encoding)
                    .with_current("1080p")
                    .with_percent(3),
            )
            .await;
        store.set(&id, ProgressPatch::default().with_percent(9)).await;

        let record = store.get(&id).await.expect("record should exist");
        assert_eq!(record.status, JobStatus::Encoding);
        assert_eq!(record.current.as_deref(), Some("1080p"));
        assert_eq!(record.percent, 9);
    }

    #[tokio::test]
    async fn test_get_unknown_id() {
        let store = MemoryProgressStore::new();
        assert!(store.get(&JobId::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_removes_record() {
        let store = MemoryProgressStore::new();
        let id = JobId::new();

        store.set(&id, ProgressPatch::default()).await;
        store.clear(&id).await;

        assert!(store.get(&id).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_jobs_do_not_bleed() {
        let store = MemoryProgressStore::new();
        let a = JobId::new();
        let b = JobId::new();

        let (store_a, id_a) = (store.clone(), a.clone());
        let (store_b, id_b) = (store.clone(), b.clone());

        let ta = tokio::spawn(async move {
            for pct in 0..=50u8 {
                store_a
                    .set(
                        &id_a,
                        ProgressPatch::status(JobStatus::Encoding)
                            .with_current("1080p")
                            .with_done(0)
                            .with_percent(pct),
                    )
                    .await;
            }
        });
        let tb = tokio::spawn(async move {
            for pct in 0..=80u8 {
                store_b
                    .set(
                        &id_b,
                        ProgressPatch::status(JobStatus::Uploading)
                            .with_current("480p")
                            .with_done(2)
                            .with_percent(pct),
                    )
                    .await;
            }
        });
        let (ra, rb) = tokio::join!(ta, tb);
        ra.expect("task a");
        rb.expect("task b");

        let rec_a = store.get(&a).await.expect("record a");
        let rec_b = store.get(&b).await.expect("record b");

        assert_eq!(rec_a.current.as_deref(), Some("1080p"));
        assert_eq!(rec_a.done, 0);
        assert_eq!(rec_a.percent, 50);

        assert_eq!(rec_b.current.as_deref(), Some("480p"));
        assert_eq!(rec_b.done, 2);
        assert_eq!(rec_b.percent, 80);
    }
}
