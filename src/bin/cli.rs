//! threadwatch CLI
//!
//! Watches a forum thread and prints posts that appeared since the last scan.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use threadwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, RunCoordinator, WatchOptions},
    services::{ConsoleReporter, ThreadCrawler},
    storage::{LocalStorage, MemoryStorage, RecordStore},
    utils,
};

/// threadwatch - Forum Thread Watcher
#[derive(Parser, Debug)]
#[command(
    name = "threadwatch",
    version,
    about = "Reports new posts in a paginated forum thread"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "threadwatch.toml")]
    config: PathBuf,

    /// Record file (overrides storage.record_path)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the thread repeatedly and print new posts
    Watch {
        /// Page to start from; required when no record exists yet
        start_page: Option<String>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Seconds between cycles (overrides schedule.interval_secs)
        #[arg(long)]
        interval: Option<u64>,

        /// Compare against the stored record but never write it
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the stored record
    Info,

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    init_logging(cli.verbose, &config.logging.level);

    if let Some(state) = cli.state {
        config.storage.record_path = state;
    }
    let storage = LocalStorage::new(&config.storage.record_path)
        .with_lock_timeout(Duration::from_millis(config.storage.lock_timeout_ms));

    match cli.command {
        Command::Watch {
            start_page,
            once,
            interval,
            dry_run,
        } => {
            if let Some(secs) = interval {
                config.schedule.interval_secs = secs;
            }
            config.validate()?;

            let config = Arc::new(config);
            let crawler = ThreadCrawler::new(Arc::clone(&config))?;
            let reporter = ConsoleReporter;

            let dry_store;
            let store: &dyn RecordStore = if dry_run {
                log::info!("Dry run: the record will not be written");
                dry_store = match storage.load().await? {
                    Some(record) => MemoryStorage::with_record(record),
                    None => MemoryStorage::new(),
                };
                &dry_store
            } else {
                &storage
            };

            let options = WatchOptions {
                interval: Duration::from_secs(config.schedule.interval_secs),
                once,
                start_page,
            };

            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("Ctrl-C received; finishing the current cycle");
                    let _ = shutdown_tx.send(true);
                }
            });

            utils::log::header(&format!("Watching {}", config.thread.url_template));
            let coordinator = RunCoordinator::new(&config.thread, &crawler, store, &reporter);
            if let Err(e) = pipeline::run_watch(&coordinator, &options, shutdown_rx).await {
                if matches!(e, AppError::ColdStartUnresolved) {
                    log::error!(
                        "No record at {}; start with `threadwatch watch <PAGE>`",
                        storage.location()
                    );
                } else {
                    log::error!("Stopping: {}", e);
                }
                return Err(e);
            }
        }

        Command::Info => {
            log::info!("Record file: {}", storage.location());
            match storage.load().await? {
                Some(record) => {
                    utils::log::header("Stored record");
                    for (number, page) in record.pages() {
                        utils::log::sub_item(&format!(
                            "page {}: {} fingerprints",
                            number,
                            page.len()
                        ));
                    }
                    utils::log::summary(
                        "Record",
                        &[
                            ("Pages", record.pages().len().to_string()),
                            ("Fingerprints", record.item_count().to_string()),
                            (
                                "Next start page",
                                record
                                    .lowest_page()
                                    .map_or_else(|| "-".to_string(), |p| p.to_string()),
                            ),
                        ],
                    );
                }
                None => log::info!("No record found yet."),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }
    }

    Ok(())
}
