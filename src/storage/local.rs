//! Local filesystem record storage.
//!
//! Writes go to a temporary sibling file that is renamed over the record, so
//! a reader sees either the old record or the new one. An advisory lock on
//! `{record}.lock` keeps a second watcher process from interleaving with us.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use fs2::FileExt;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::FingerprintRecord;
use crate::storage::RecordStore;

const LOCK_POLL: Duration = Duration::from_millis(10);

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
    lock_timeout: Duration,
}

impl LocalStorage {
    /// Create a LocalStorage for the record at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn lock(&self, kind: LockKind) -> Result<RecordLock> {
        RecordLock::acquire(&self.lock_path(), kind, self.lock_timeout).await
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl RecordStore for LocalStorage {
    async fn load(&self) -> Result<Option<FingerprintRecord>> {
        // A missing record needs no lock; reading must not create files.
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| AppError::storage_read(&self.path, e))?;
        if !exists {
            log::info!("No record found at {}", self.path.display());
            return Ok(None);
        }

        let _guard = self.lock(LockKind::Shared).await?;

        let Some(bytes) = self
            .read_bytes()
            .await
            .map_err(|e| AppError::storage_read(&self.path, e))?
        else {
            log::info!("No record found at {}", self.path.display());
            return Ok(None);
        };

        let record: FingerprintRecord = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::storage_read(&self.path, e))?;
        log::debug!(
            "Loaded record with {} pages and {} fingerprints from {}",
            record.pages().len(),
            record.item_count(),
            self.path.display()
        );
        Ok(Some(record))
    }

    async fn save(&self, record: &FingerprintRecord) -> Result<()> {
        self.ensure_dir(&self.path)
            .await
            .map_err(|e| AppError::storage_write(&self.path, e))?;
        let _guard = self.lock(LockKind::Exclusive).await?;

        let bytes = serde_json::to_vec(record)?;
        if let Err(e) = self.write_bytes(&bytes).await {
            let _ = tokio::fs::remove_file(self.tmp_path()).await;
            return Err(AppError::storage_write(&self.path, e));
        }

        log::debug!(
            "Saved record with {} fingerprints to {}",
            record.item_count(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

/// Advisory lock held for the duration of a load or save.
#[derive(Debug)]
struct RecordLock {
    file: File,
}

impl RecordLock {
    async fn acquire(path: &Path, kind: LockKind, timeout: Duration) -> Result<Self> {
        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(|e| match kind {
                    LockKind::Shared => AppError::storage_read(path, e),
                    LockKind::Exclusive => AppError::storage_write(path, e),
                })?;

            let acquired = match kind {
                LockKind::Shared => FileExt::try_lock_shared(&file).is_ok(),
                LockKind::Exclusive => FileExt::try_lock_exclusive(&file).is_ok(),
            };
            if acquired {
                return Ok(Self { file });
            }

            if start.elapsed() >= timeout {
                return Err(AppError::LockTimeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            tokio::time::sleep(LOCK_POLL).await;
        }
    }
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemHash, Page};
    use tempfile::TempDir;

    fn sample_record() -> FingerprintRecord {
        FingerprintRecord::new()
            .with_page(5, Page::new(vec![ItemHash::new("a"), ItemHash::new("c")]))
            .with_page(4, Page::new(vec![ItemHash::new("b")]))
    }

    #[tokio::test]
    async fn test_load_missing_is_cold_start() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("persist.json"));

        assert!(storage.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("persist.json"));
        let record = sample_record();

        storage.save(&record).await.unwrap();
        assert_eq!(storage.load().await.unwrap(), Some(record));
        assert!(!storage.tmp_path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_record() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("persist.json"));

        storage.save(&sample_record()).await.unwrap();
        let newer = FingerprintRecord::new().with_page(6, Page::new(vec![ItemHash::new("d")]));
        storage.save(&newer).await.unwrap();

        assert_eq!(storage.load().await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn test_save_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("state/nested/persist.json"));

        storage.save(&sample_record()).await.unwrap();
        assert!(storage.path().exists());
    }

    #[tokio::test]
    async fn test_written_file_matches_wire_format() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("persist.json"));
        storage.save(&sample_record()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(storage.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({
                "5": {"items": [{"texthash": "a"}, {"texthash": "c"}]},
                "4": {"items": [{"texthash": "b"}]}
            })
        );
    }

    #[tokio::test]
    async fn test_corrupt_record_is_read_failure() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("persist.json");
        std::fs::write(&path, b"{\"5\": {\"items\": [").unwrap();

        let storage = LocalStorage::new(&path);
        assert!(matches!(
            storage.load().await,
            Err(AppError::StorageRead { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_path_is_read_failure() {
        let tmp = TempDir::new().unwrap();
        // A directory where the record file should be.
        let path = tmp.path().join("persist.json");
        std::fs::create_dir(&path).unwrap();

        let storage = LocalStorage::new(&path);
        assert!(matches!(
            storage.load().await,
            Err(AppError::StorageRead { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("state/persist.json"));

        assert!(storage.load().await.unwrap().is_none());
        assert!(!tmp.path().join("state").exists());

        let storage = LocalStorage::new(tmp.path().join("persist.json"));
        assert!(storage.load().await.unwrap().is_none());
        assert!(!storage.lock_path().exists());
    }

    #[tokio::test]
    async fn test_unwritable_parent_is_write_failure() {
        let tmp = TempDir::new().unwrap();
        // A regular file where the record's directory should be.
        let blocker = tmp.path().join("state");
        std::fs::write(&blocker, b"").unwrap();

        let storage = LocalStorage::new(blocker.join("persist.json"));
        assert!(matches!(
            storage.save(&sample_record()).await,
            Err(AppError::StorageWrite { .. })
        ));
    }

    #[tokio::test]
    async fn test_unopenable_lock_is_read_failure() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("persist.json"));
        storage.save(&sample_record()).await.unwrap();

        std::fs::remove_file(storage.lock_path()).unwrap();
        std::fs::create_dir(storage.lock_path()).unwrap();

        assert!(matches!(
            storage.load().await,
            Err(AppError::StorageRead { .. })
        ));
    }

    #[tokio::test]
    async fn test_lock_timeout_when_held_elsewhere() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("persist.json"))
            .with_lock_timeout(Duration::from_millis(50));

        let holder = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(storage.lock_path())
            .unwrap();
        FileExt::lock_exclusive(&holder).unwrap();

        assert!(matches!(
            storage.save(&sample_record()).await,
            Err(AppError::LockTimeout { .. })
        ));
        assert!(!storage.path().exists());

        FileExt::unlock(&holder).unwrap();
        storage.save(&sample_record()).await.unwrap();
    }
}
