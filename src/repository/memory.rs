use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::ArchitectureRepository;
use crate::error::StorageError;
use crate::models::ArchitectureRecord;

/// In-memory record storage for tests and local development.
#[derive(Default)]
pub struct InMemoryArchitectureRepository {
    records: Arc<Mutex<Vec<ArchitectureRecord>>>,
}

impl InMemoryArchitectureRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArchitectureRepository for InMemoryArchitectureRepository {
    async fn insert(&self, record: &ArchitectureRecord) -> Result<String, StorageError> {
        let mut records = self.records.lock().await;
        records.push(record.clone());
        debug!("Stored record {} in memory ({} total)", record.id, records.len());
        Ok(record.id.clone())
    }

    async fn list_all(&self) -> Result<Vec<ArchitectureRecord>, StorageError> {
        Ok(self.records.lock().await.clone())
    }

    async fn delete_all(&self) -> Result<u64, StorageError> {
        let mut records = self.records.lock().await;
        let removed = records.len() as u64;
        records.clear();
        Ok(removed)
    }
}
