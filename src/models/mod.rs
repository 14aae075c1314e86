// src/models/mod.rs

//! Domain models for the thread watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod crawler;
mod item;
mod record;
mod selectors;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, LoggingConfig, PAGE_PLACEHOLDER, ScheduleConfig, StorageConfig,
    ThreadConfig,
};
pub use crawler::FetchOutcome;
pub use item::{Item, ItemHash, Page};
pub use record::{FingerprintRecord, PageNumber, WINDOW_PAGES, Window};
pub use selectors::ThreadSelectors;
