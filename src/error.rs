// src/error.rs

//! Unified error handling for the thread watcher.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No stored record and no start page to begin from
    #[error("No stored record found and no start page given; cannot pick a starting point")]
    ColdStartUnresolved,

    /// Page number could not be read from an item's source URL
    #[error("Cannot read a page number from locator '{locator}'")]
    MalformedLocator { locator: String },

    /// Stored record exists but could not be read or decoded
    #[error("Failed to read record {path}: {message}")]
    StorageRead { path: PathBuf, message: String },

    /// Record could not be written
    #[error("Failed to write record {path}: {message}")]
    StorageWrite { path: PathBuf, message: String },

    /// Another process is holding the record lock
    #[error("Timed out after {waited:?} waiting for lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Crawling error
    #[error("Crawl error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a crawl error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed locator error.
    pub fn malformed_locator(locator: impl Into<String>) -> Self {
        Self::MalformedLocator {
            locator: locator.into(),
        }
    }

    /// Create a storage read error for `path`.
    pub fn storage_read(path: &Path, message: impl fmt::Display) -> Self {
        Self::StorageRead {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Create a storage write error for `path`.
    pub fn storage_write(path: &Path, message: impl fmt::Display) -> Self {
        Self::StorageWrite {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}
