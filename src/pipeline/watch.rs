// src/pipeline/watch.rs

//! Fixed-delay loop running scan cycles back to back.

use std::time::Duration;

use tokio::sync::watch;

use crate::error::Result;
use crate::pipeline::cycle::RunCoordinator;
use crate::utils;

/// Options for the outer loop.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Pause between the end of one cycle and the start of the next
    pub interval: Duration,
    /// Stop after the first cycle
    pub once: bool,
    /// Page to start from when there is no record to resume from
    pub start_page: Option<String>,
}

/// Totals over a watch session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: usize,
    pub reported: usize,
    pub writes: usize,
}

/// Run cycles until `once`, a shutdown signal, or a fatal error.
///
/// Shutdown is only observed between cycles; a running cycle always
/// finishes, so the record is never left half-written by cancellation.
pub async fn run_watch(
    coordinator: &RunCoordinator<'_>,
    options: &WatchOptions,
    mut shutdown: watch::Receiver<bool>,
) -> Result<WatchSummary> {
    let mut previous = coordinator.load_initial().await?;
    let mut summary = WatchSummary::default();

    loop {
        // The explicit page applies to the first cycle, and to later ones
        // only while there is still no record to resume from.
        let use_explicit = summary.cycles == 0 || previous.as_ref().is_none_or(|r| r.is_empty());
        let start = if use_explicit {
            options.start_page.as_deref()
        } else {
            None
        };

        let outcome = coordinator.run_cycle(previous.take(), start).await?;
        summary.cycles += 1;
        summary.reported += outcome.reported.len();
        summary.writes += usize::from(outcome.persisted);
        previous = Some(outcome.record);

        if options.once || *shutdown.borrow() {
            break;
        }

        log::info!("Executed. Waiting for {} seconds", options.interval.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(options.interval) => {}
            _ = shutdown_requested(&mut shutdown) => {
                log::info!("Shutdown requested, stopping");
                break;
            }
        }
    }

    utils::log::summary(
        "Watch session",
        &[
            ("Cycles", summary.cycles.to_string()),
            ("New posts", summary.reported.to_string()),
            ("Record writes", summary.writes.to_string()),
        ],
    );
    Ok(summary)
}

/// Resolves once the shutdown flag is set; never if the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::{FetchOutcome, Item, ThreadConfig};
    use crate::services::{CollectingReporter, Fetcher};
    use crate::storage::{MemoryStorage, RecordStore};

    struct FixedFetcher;

    #[async_trait]
    impl Fetcher for FixedFetcher {
        async fn fetch(&self, _start_url: &str) -> FetchOutcome {
            FetchOutcome {
                items: vec![
                    Item::new("a", "https://forum.example/deals-4.html"),
                    Item::new("b", "https://forum.example/deals-5.html"),
                ],
                pages_fetched: 2,
                page_failures: 0,
            }
        }
    }

    fn thread() -> ThreadConfig {
        ThreadConfig {
            url_template: "https://forum.example/deals-{page}.html".to_string(),
            allowed_domains: vec!["forum.example".to_string()],
            ..ThreadConfig::default()
        }
    }

    fn options(once: bool, start_page: Option<&str>) -> WatchOptions {
        WatchOptions {
            interval: Duration::from_millis(10),
            once,
            start_page: start_page.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_once_runs_single_cycle() {
        let storage = MemoryStorage::new();
        let reporter = CollectingReporter::new();
        let thread = thread();
        let coordinator = RunCoordinator::new(&thread, &FixedFetcher, &storage, &reporter);
        let (_tx, rx) = watch::channel(false);

        let summary = run_watch(&coordinator, &options(true, Some("4")), rx)
            .await
            .unwrap();

        assert_eq!(
            summary,
            WatchSummary {
                cycles: 1,
                reported: 2,
                writes: 1
            }
        );
    }

    #[tokio::test]
    async fn test_cold_start_without_page_is_fatal() {
        let storage = MemoryStorage::new();
        let reporter = CollectingReporter::new();
        let thread = thread();
        let coordinator = RunCoordinator::new(&thread, &FixedFetcher, &storage, &reporter);
        let (_tx, rx) = watch::channel(false);

        let result = run_watch(&coordinator, &options(true, None), rx).await;
        assert!(matches!(result, Err(AppError::ColdStartUnresolved)));
    }

    #[tokio::test]
    async fn test_resumes_from_stored_record() {
        let storage = MemoryStorage::new();
        let reporter = CollectingReporter::new();
        let thread = thread();
        let coordinator = RunCoordinator::new(&thread, &FixedFetcher, &storage, &reporter);

        let (_tx, rx) = watch::channel(false);
        run_watch(&coordinator, &options(true, Some("4")), rx)
            .await
            .unwrap();

        // Second session: no start page, resumes from the stored record.
        let (_tx, rx) = watch::channel(false);
        let summary = run_watch(&coordinator, &options(true, None), rx)
            .await
            .unwrap();

        assert_eq!(summary.reported, 0);
        assert_eq!(summary.writes, 0);
        assert_eq!(storage.load().await.unwrap().unwrap().lowest_page(), Some(4));
    }

    #[tokio::test]
    async fn test_shutdown_stops_between_cycles() {
        let storage = MemoryStorage::new();
        let reporter = CollectingReporter::new();
        let thread = thread();
        let coordinator = RunCoordinator::new(&thread, &FixedFetcher, &storage, &reporter);
        let (tx, rx) = watch::channel(false);

        let opts = WatchOptions {
            interval: Duration::from_secs(3600),
            ..options(false, Some("4"))
        };
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        let (summary, ()) = tokio::join!(run_watch(&coordinator, &opts, rx), stopper);

        let summary = summary.unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(reporter.texts(), vec!["a", "b"]);
    }
}
