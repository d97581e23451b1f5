use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::models::{AnalysisRecord, NewAnalysisRecord};
use crate::error::Result;
use crate::repository::AnalysisStore;

/// Process-local store used in mock mode and tests. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryAnalysisStore {
    records: DashMap<String, AnalysisRecord>,
    // serializes batch deletes so the existence check and removal happen together
    batch: Mutex<()>,
}

impl MemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AnalysisStore for MemoryAnalysisStore {
    async fn save(&self, record: NewAnalysisRecord) -> Option<AnalysisRecord> {
        let record = AnalysisRecord::from_new(record);
        self.records.insert(record.id.clone(), record.clone());
        Some(record)
    }

    async fn get_all(&self) -> Result<Vec<AnalysisRecord>> {
        let mut all: Vec<AnalysisRecord> = self.records.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<AnalysisRecord>> {
        Ok(self.records.get(id).map(|e| e.value().clone()))
    }

    async fn delete_by_id(&self, id: &str) -> bool {
        let _guard = self.batch.lock().await;
        self.records.remove(id).is_some()
    }

    async fn delete_by_ids(&self, ids: &[String]) -> bool {
        if ids.is_empty() {
            return false;
        }

        let _guard = self.batch.lock().await;
        if !ids.iter().all(|id| self.records.contains_key(id)) {
            return false;
        }
        for id in ids {
            self.records.remove(id);
        }
        true
    }
}
