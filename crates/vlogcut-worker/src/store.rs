//! Job registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use vlogcut_models::{JobId, JobRecord};

use crate::error::{WorkerError, WorkerResult};

/// Storage for job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new record; fails if the id is taken.
    async fn create(&self, record: &JobRecord) -> WorkerResult<()>;

    async fn get(&self, id: &JobId) -> WorkerResult<Option<JobRecord>>;

    /// Replace an existing record; fails if it does not exist.
    async fn update(&self, record: &JobRecord) -> WorkerResult<()>;

    /// Returns whether a record was removed.
    async fn delete(&self, id: &JobId) -> WorkerResult<bool>;

    /// Records ordered by creation time, newest first.
    async fn list(&self, limit: Option<usize>) -> WorkerResult<Vec<JobRecord>>;
}

/// Process-local [`JobStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, record: &JobRecord) -> WorkerResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&record.id) {
            return Err(WorkerError::JobExists(record.id.clone()));
        }
        jobs.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, id: &JobId) -> WorkerResult<Option<JobRecord>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn update(&self, record: &JobRecord) -> WorkerResult<()> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(WorkerError::JobNotFound(record.id.clone())),
        }
    }

    async fn delete(&self, id: &JobId) -> WorkerResult<bool> {
        Ok(self.jobs.write().await.remove(id).is_some())
    }

    async fn list(&self, limit: Option<usize>) -> WorkerResult<Vec<JobRecord>> {
        let jobs = self.jobs.read().await;
        let mut records: Vec<JobRecord> = jobs.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }
}
