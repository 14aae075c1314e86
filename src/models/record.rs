//! Window and persisted fingerprint record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemHash, Page};

/// Page numbers as parsed from thread URLs.
pub type PageNumber = u32;

/// Number of trailing pages kept between runs.
pub const WINDOW_PAGES: u32 = 2;

/// The trailing pages observed in the current run, with full item text.
///
/// Holds `last_page` and, when the thread has more than one page,
/// `last_page - 1` (empty if nothing was seen there).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Window {
    pages: BTreeMap<PageNumber, Page<Item>>,
}

impl Window {
    /// Build a window from all aggregated pages of a run.
    pub fn from_pages(mut all: BTreeMap<PageNumber, Page<Item>>) -> Self {
        let Some(&last_page) = all.keys().next_back() else {
            return Self::default();
        };

        let first_kept = last_page.saturating_sub(WINDOW_PAGES - 1).max(1);
        let mut pages = BTreeMap::new();
        for number in first_kept..=last_page {
            pages.insert(number, all.remove(&number).unwrap_or_default());
        }
        // Single-page threads numbered from zero.
        if last_page == 0 {
            pages.insert(0, all.remove(&0).unwrap_or_default());
        }

        Self { pages }
    }

    pub fn pages(&self) -> &BTreeMap<PageNumber, Page<Item>> {
        &self.pages
    }

    pub fn last_page(&self) -> Option<PageNumber> {
        self.pages.keys().next_back().copied()
    }

    pub fn first_page(&self) -> Option<PageNumber> {
        self.pages.keys().next().copied()
    }

    /// All items in page order, then encounter order.
    pub fn items(&self) -> impl Iterator<Item = (PageNumber, &Item)> {
        self.pages
            .iter()
            .flat_map(|(number, page)| page.items.iter().map(move |item| (*number, item)))
    }

    pub fn item_count(&self) -> usize {
        self.pages.values().map(Page::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }
}

/// Fingerprint-only snapshot of a window, as stored between runs.
///
/// Serialized as `{"<page>": {"items": [{"texthash": "..."}]}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintRecord {
    pages: BTreeMap<PageNumber, Page<ItemHash>>,
}

impl FingerprintRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pages(pages: BTreeMap<PageNumber, Page<ItemHash>>) -> Self {
        Self { pages }
    }

    /// Builder-style page insertion, mostly for fixtures.
    pub fn with_page(mut self, number: PageNumber, page: Page<ItemHash>) -> Self {
        self.pages.insert(number, page);
        self
    }

    pub fn pages(&self) -> &BTreeMap<PageNumber, Page<ItemHash>> {
        &self.pages
    }

    pub fn page(&self, number: PageNumber) -> Option<&Page<ItemHash>> {
        self.pages.get(&number)
    }

    /// Lowest retained page; the next run resumes from here.
    pub fn lowest_page(&self) -> Option<PageNumber> {
        self.pages.keys().next().copied()
    }

    pub fn highest_page(&self) -> Option<PageNumber> {
        self.pages.keys().next_back().copied()
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemHash> {
        self.pages.values().flat_map(|page| page.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.pages.values().map(Page::len).sum()
    }

    /// True when the record has no pages at all.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
