// src/models/crawler.rs

use super::item::Item;

/// Summary of one crawl of the thread.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Posts in discovery order
    pub items: Vec<Item>,
    pub pages_fetched: usize,
    pub page_failures: usize,
}

impl FetchOutcome {
    /// True when some page could not be fetched, so items may be missing.
    pub fn is_partial(&self) -> bool {
        self.page_failures > 0
    }
}
