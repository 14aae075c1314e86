//! In-memory record storage.
//!
//! Backs `watch --dry-run` and the coordinator tests. Counts saves so callers
//! can tell whether a cycle wrote anything.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::FingerprintRecord;
use crate::storage::RecordStore;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    record: Mutex<Option<FingerprintRecord>>,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `record` already stored.
    pub fn with_record(record: FingerprintRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Currently stored record.
    pub fn snapshot(&self) -> Option<FingerprintRecord> {
        self.record.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl RecordStore for MemoryStorage {
    async fn load(&self) -> Result<Option<FingerprintRecord>> {
        let guard = self
            .record
            .lock()
            .map_err(|e| AppError::storage_read(Path::new("memory"), e))?;
        Ok(guard.clone())
    }

    async fn save(&self, record: &FingerprintRecord) -> Result<()> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| AppError::storage_write(Path::new("memory"), e))?;
        *guard = Some(record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemHash, Page};

    #[tokio::test]
    async fn test_round_trip_and_count() {
        let storage = MemoryStorage::new();
        assert!(storage.load().await.unwrap().is_none());

        let record = FingerprintRecord::new().with_page(2, Page::new(vec![ItemHash::new("x")]));
        storage.save(&record).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Some(record.clone()));
        assert_eq!(storage.snapshot(), Some(record));
        assert_eq!(storage.save_count(), 1);
    }
}
