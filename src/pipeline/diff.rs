//! Diff calculation between the current window and the stored record.
//!
//! Both sides are flattened into unordered fingerprint sets before
//! differencing. Posts routinely move from page N to page N+1 as a thread
//! grows, so a page-by-page comparison would flag old posts as new.

use std::collections::HashSet;

use crate::models::{FingerprintRecord, Item, Window};
use crate::pipeline::fingerprint::Fingerprint;
use crate::storage::strip_to_fingerprints;

/// Result of comparing a window against the previous record.
#[derive(Debug, Clone, Default)]
pub struct DiffResult {
    /// False when the stripped window equals the previous record exactly
    pub changed: bool,
    /// Fingerprints seen now but not before, in first-seen order
    pub added: Vec<Fingerprint>,
    /// Full items carrying an added fingerprint, in page then encounter order
    pub added_items: Vec<Item>,
}

impl DiffResult {
    /// Check if the record needs rewriting.
    pub fn has_changes(&self) -> bool {
        self.changed
    }

    /// Number of items to report.
    pub fn change_count(&self) -> usize {
        self.added_items.len()
    }
}

/// Calculator for computing diffs between a window and a record.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine;

impl DiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fingerprints present in `current` but absent from `previous`.
    pub fn new_fingerprints<'a>(
        &self,
        current: &'a FingerprintRecord,
        previous: &FingerprintRecord,
    ) -> HashSet<&'a Fingerprint> {
        let previous: HashSet<&Fingerprint> = previous.items().map(|i| &i.texthash).collect();
        current
            .items()
            .map(|i| &i.texthash)
            .filter(|fp| !previous.contains(fp))
            .collect()
    }

    /// Map new fingerprints back to the full items of the window.
    pub fn resolve(&self, window: &Window, new: &HashSet<&Fingerprint>) -> Vec<Item> {
        window
            .items()
            .filter(|(_, item)| new.contains(item.fingerprint()))
            .map(|(_, item)| item.clone())
            .collect()
    }

    /// Compare `window` (already stripped to `current`) against `previous`.
    pub fn calculate(
        &self,
        window: &Window,
        current: &FingerprintRecord,
        previous: &FingerprintRecord,
    ) -> DiffResult {
        if current == previous {
            return DiffResult::default();
        }

        let new = self.new_fingerprints(current, previous);
        let added_items = self.resolve(window, &new);

        let mut seen = HashSet::new();
        let added = added_items
            .iter()
            .map(Item::fingerprint)
            .filter(|fp| seen.insert(*fp))
            .cloned()
            .collect();

        DiffResult {
            changed: true,
            added,
            added_items,
        }
    }
}

/// Convenience function to calculate diff.
pub fn calculate_diff(window: &Window, previous: &FingerprintRecord) -> DiffResult {
    let current = strip_to_fingerprints(window);
    DiffEngine::new().calculate(window, &current, previous)
}
