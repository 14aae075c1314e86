// src/pipeline/cycle.rs

//! One scan cycle: fetch, aggregate, diff, report, persist.

use crate::error::{AppError, Result};
use crate::models::{FingerprintRecord, Item, ThreadConfig};
use crate::pipeline::aggregate::build_window;
use crate::pipeline::diff::DiffEngine;
use crate::pipeline::window_guard::WindowGuard;
use crate::services::{Fetcher, Reporter};
use crate::storage::{RecordStore, strip_to_fingerprints};

/// Result of a single cycle.
#[derive(Debug, Default)]
pub struct CycleOutcome {
    /// Record to feed into the next cycle
    pub record: FingerprintRecord,
    /// Posts handed to the reporter
    pub reported: Vec<Item>,
    /// Whether the record was written
    pub persisted: bool,
    pub pages_fetched: usize,
    pub page_failures: usize,
}

/// Pick the page a cycle starts crawling from.
///
/// An explicit page wins; otherwise resume from the lowest page the previous
/// record kept, so nothing between the two runs is skipped.
pub fn resolve_start_page(
    explicit: Option<&str>,
    previous: Option<&FingerprintRecord>,
) -> Result<String> {
    if let Some(page) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        return Ok(page.to_string());
    }
    previous
        .and_then(FingerprintRecord::lowest_page)
        .map(|page| page.to_string())
        .ok_or(AppError::ColdStartUnresolved)
}

/// Drives scan cycles against a fetcher, a record store and a reporter.
pub struct RunCoordinator<'a> {
    thread: &'a ThreadConfig,
    fetcher: &'a dyn Fetcher,
    storage: &'a dyn RecordStore,
    reporter: &'a dyn Reporter,
}

impl<'a> RunCoordinator<'a> {
    pub fn new(
        thread: &'a ThreadConfig,
        fetcher: &'a dyn Fetcher,
        storage: &'a dyn RecordStore,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            thread,
            fetcher,
            storage,
            reporter,
        }
    }

    /// Read the durable record once at startup.
    pub async fn load_initial(&self) -> Result<Option<FingerprintRecord>> {
        self.storage.load().await
    }

    /// Run one cycle.
    ///
    /// `previous` is the record returned by the last cycle (or loaded at
    /// startup). Fatal conditions are returned as errors; the durable record
    /// is left untouched in that case.
    pub async fn run_cycle(
        &self,
        previous: Option<FingerprintRecord>,
        explicit_start: Option<&str>,
    ) -> Result<CycleOutcome> {
        let start_page = resolve_start_page(explicit_start, previous.as_ref())?;
        let previous = previous.unwrap_or_default();
        let start_url = self.thread.page_url(&start_page);
        log::info!("Scanning thread from page {} ({})", start_page, start_url);

        // The fetcher returns only after the whole crawl has finished.
        let fetched = self.fetcher.fetch(&start_url).await;
        let mut outcome = CycleOutcome {
            pages_fetched: fetched.pages_fetched,
            page_failures: fetched.page_failures,
            ..CycleOutcome::default()
        };
        if fetched.is_partial() {
            log::warn!(
                "{} pages failed to load; this cycle's results are best-effort",
                fetched.page_failures
            );
        }
        if fetched.items.is_empty() {
            log::warn!("No posts fetched; keeping the previous record");
            outcome.record = previous;
            return Ok(outcome);
        }

        let (window, all_pages) = build_window(fetched.items)?;
        let current = strip_to_fingerprints(&window);
        let check = WindowGuard::new().inspect(&all_pages, &window, &previous);

        let diff = DiffEngine::new().calculate(&window, &current, &previous);
        if !diff.has_changes() {
            log::info!("No changes in pages {:?}", current.pages().keys());
            outcome.record = previous;
            return Ok(outcome);
        }

        let mut reported = Vec::new();
        if self.thread.report_overflow {
            reported.extend(check.overflow_items().iter().cloned());
        }
        reported.extend(diff.added_items);

        log::info!("{} new posts", reported.len());
        for item in &reported {
            log::debug!("New post {} on {}", item.fingerprint().short(), item.source());
            self.reporter.report(item);
        }

        self.storage.save(&current).await?;
        log::info!("Record saved to {}", self.storage.location());

        outcome.record = current;
        outcome.reported = reported;
        outcome.persisted = true;
        Ok(outcome)
    }
}
