//! In-memory status table

use super::types::{JobRecord, StatusUpdate};
use super::StatusTable;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Status table kept in process memory
///
/// Every update is also appended to a history so callers can inspect the
/// exact sequence of writes for a job.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatusTable {
    items: Arc<RwLock<HashMap<String, JobRecord>>>,
    history: Arc<RwLock<Vec<(String, StatusUpdate)>>>,
}

impl InMemoryStatusTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item, replacing any existing one
    pub async fn insert(&self, record: JobRecord) {
        let mut items = self.items.write().await;
        items.insert(record.job_id.clone(), record);
    }

    /// Updates applied to a job, oldest first
    pub async fn history(&self, job_id: &str) -> Vec<StatusUpdate> {
        let history = self.history.read().await;
        history
            .iter()
            .filter(|(id, _)| id == job_id)
            .map(|(_, update)| update.clone())
            .collect()
    }

    /// Total number of updates applied
    pub async fn write_count(&self) -> usize {
        self.history.read().await.len()
    }
}

#[async_trait]
impl StatusTable for InMemoryStatusTable {
    async fn update(&self, job_id: &str, update: &StatusUpdate) -> Result<()> {
        {
            let mut items = self.items.write().await;
            items
                .entry(job_id.to_string())
                .or_insert_with(|| JobRecord::bare(job_id))
                .apply(update);
        }

        let mut history = self.history.write().await;
        history.push((job_id.to_string(), update.clone()));
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Result<Option<JobRecord>> {
        let items = self.items.read().await;
        Ok(items.get(job_id).cloned())
    }
}
