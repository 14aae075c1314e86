//! Detection of posts that fell outside the two-page window.
//!
//! Only the last two pages are kept between runs. If more than a page of
//! posts arrives between two cycles, posts on the pages that scrolled out of
//! the window are never compared and would be silently missed. This guard
//! finds those posts so they can at least be logged, and optionally
//! reported.

use std::collections::{BTreeMap, HashSet};

use crate::models::{FingerprintRecord, Item, Page, PageNumber, Window};
use crate::pipeline::fingerprint::Fingerprint;

/// Result of a window check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCheck {
    /// No previous record to compare against
    ColdStart,
    /// Everything new is inside the window
    Contained,
    /// Unseen posts exist on pages below the window
    Overflow {
        pages: Vec<PageNumber>,
        items: Vec<Item>,
    },
}

impl WindowCheck {
    /// Posts that would otherwise go unreported.
    pub fn overflow_items(&self) -> &[Item] {
        match self {
            WindowCheck::Overflow { items, .. } => items,
            _ => &[],
        }
    }
}

/// Checks a cycle's crawl for posts the window cannot see.
#[derive(Debug, Clone, Default)]
pub struct WindowGuard;

impl WindowGuard {
    pub fn new() -> Self {
        Self
    }

    /// Classify a crawl.
    ///
    /// A post counts as overflow when it sits on a page below the window, at
    /// or above the first page the previous record covered, and its
    /// fingerprint is unknown to that record.
    pub fn check(
        &self,
        all_pages: &BTreeMap<PageNumber, Page<Item>>,
        window: &Window,
        previous: &FingerprintRecord,
    ) -> WindowCheck {
        let (Some(previous_low), Some(window_low)) = (previous.lowest_page(), window.first_page())
        else {
            return WindowCheck::ColdStart;
        };
        if previous.item_count() == 0 {
            return WindowCheck::ColdStart;
        }
        if previous_low >= window_low {
            return WindowCheck::Contained;
        }

        let known: HashSet<&Fingerprint> = previous.items().map(|i| &i.texthash).collect();
        let mut pages = Vec::new();
        let mut items = Vec::new();

        for (number, page) in all_pages.range(previous_low..window_low) {
            let unseen: Vec<Item> = page
                .items
                .iter()
                .filter(|item| !known.contains(item.fingerprint()))
                .cloned()
                .collect();
            if !unseen.is_empty() {
                pages.push(*number);
                items.extend(unseen);
            }
        }

        if items.is_empty() {
            WindowCheck::Contained
        } else {
            WindowCheck::Overflow { pages, items }
        }
    }

    /// Check and log the outcome.
    pub fn inspect(
        &self,
        all_pages: &BTreeMap<PageNumber, Page<Item>>,
        window: &Window,
        previous: &FingerprintRecord,
    ) -> WindowCheck {
        let check = self.check(all_pages, window, previous);
        match &check {
            WindowCheck::ColdStart => {
                log::info!("Window guard: COLD START (no previous fingerprints)");
            }
            WindowCheck::Contained => {
                log::debug!("Window guard: all new posts inside the window");
            }
            WindowCheck::Overflow { pages, items } => {
                log::warn!(
                    "Window guard: {} unseen posts on pages {:?} fell outside the window; \
                     the thread moved more than one page since the last cycle",
                    items.len(),
                    pages
                );
            }
        }
        check
    }
}
