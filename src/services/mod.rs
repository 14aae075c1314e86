//! Service layer for the thread watcher.
//!
//! This module contains the collaborators a scan cycle talks to:
//! - Page fetching (`Fetcher`, implemented by `ThreadCrawler`)
//! - Output of new posts (`Reporter`)

mod reporter;
mod thread;

use async_trait::async_trait;

use crate::models::FetchOutcome;

pub use reporter::{CollectingReporter, ConsoleReporter, Reporter};
pub use thread::ThreadCrawler;

/// Source of thread posts.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Crawl from `start_url` following "next page" links until exhausted.
    ///
    /// Page failures are logged and counted, never returned: the outcome
    /// holds whatever was collected.
    async fn fetch(&self, start_url: &str) -> FetchOutcome;
}
