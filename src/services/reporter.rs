//! Reporting sinks for newly seen posts.

use std::sync::Mutex;

use crate::models::Item;
use crate::utils;

/// Receives each newly seen post once per cycle it is first detected in.
pub trait Reporter: Send + Sync {
    fn report(&self, item: &Item);
}

/// Prints new posts to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, item: &Item) {
        utils::log::new_post(item.source(), item.text());
    }
}

/// Keeps reported posts in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    items: Mutex<Vec<Item>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of everything reported so far, in report order.
    pub fn texts(&self) -> Vec<String> {
        self.items
            .lock()
            .map(|items| items.iter().map(|i| i.text().to_string()).collect())
            .unwrap_or_default()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, item: &Item) {
        if let Ok(mut items) = self.items.lock() {
            items.push(item.clone());
        }
    }
}
