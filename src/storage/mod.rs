//! Storage abstractions for the fingerprint record.
//!
//! The record is the only state carried between runs: the fingerprints of
//! the last two thread pages, without post text or page URLs.
//!
//! ## File Layout
//!
//! ```text
//! {record_path}          # e.g. persist.json
//! {record_path}.lock     # advisory lock, shared for reads, exclusive for writes
//! ```

pub mod local;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FingerprintRecord, Page, Window};

// Re-export for convenience
pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Trait for record storage backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the stored record.
    ///
    /// `Ok(None)` means nothing has been stored yet (cold start). Any other
    /// failure is an error.
    async fn load(&self) -> Result<Option<FingerprintRecord>>;

    /// Replace the stored record. Readers never observe a partial write.
    async fn save(&self, record: &FingerprintRecord) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Project a window down to the fingerprint-only shape that is persisted.
pub fn strip_to_fingerprints(window: &Window) -> FingerprintRecord {
    FingerprintRecord::from_pages(
        window
            .pages()
            .iter()
            .map(|(number, page)| {
                (
                    *number,
                    Page::new(page.items.iter().map(|item| item.to_hash()).collect()),
                )
            })
            .collect(),
    )
}
