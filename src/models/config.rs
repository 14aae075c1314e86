//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ThreadSelectors;

/// Placeholder replaced by the page number in `thread.url_template`.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// The watched thread
    #[serde(default)]
    pub thread: ThreadConfig,

    /// Record file location and locking
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outer loop timing
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if !self.thread.url_template.contains(PAGE_PLACEHOLDER) {
            return Err(AppError::validation(format!(
                "thread.url_template must contain {PAGE_PLACEHOLDER}"
            )));
        }
        url::Url::parse(&self.thread.page_url("1"))?;
        if self.thread.allowed_domains.is_empty() {
            return Err(AppError::validation("thread.allowed_domains is empty"));
        }
        for (name, selector) in self.thread.selectors.labelled() {
            Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{name}: {e:?}")))?;
        }
        if self.storage.record_path.as_os_str().is_empty() {
            return Err(AppError::validation("storage.record_path is empty"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::validation("schedule.interval_secs must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Upper bound of the random delay before each request, in milliseconds
    #[serde(default = "defaults::random_delay")]
    pub random_delay_ms: u64,

    /// Maximum concurrent requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Stop following "next" links after this many pages in one crawl
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            random_delay_ms: defaults::random_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// The thread being watched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadConfig {
    /// Page URL with a `{page}` placeholder
    #[serde(default = "defaults::url_template")]
    pub url_template: String,

    /// Hosts the crawler may follow links to
    #[serde(default = "defaults::allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Also report unseen posts that fell outside the two-page window
    #[serde(default)]
    pub report_overflow: bool,

    #[serde(default)]
    pub selectors: ThreadSelectors,
}

impl ThreadConfig {
    /// URL of the given thread page.
    pub fn page_url(&self, page: &str) -> String {
        self.url_template.replace(PAGE_PLACEHOLDER, page)
    }

    /// Whether `host` is on the allow-list (case-insensitive).
    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(host))
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            url_template: defaults::url_template(),
            allowed_domains: defaults::allowed_domains(),
            report_overflow: false,
            selectors: ThreadSelectors::default(),
        }
    }
}

/// Record persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the fingerprint record file
    #[serde(default = "defaults::record_path")]
    pub record_path: PathBuf,

    /// How long to wait for the record lock, in milliseconds
    #[serde(default = "defaults::lock_timeout")]
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            record_path: defaults::record_path(),
            lock_timeout_ms: defaults::lock_timeout(),
        }
    }
}

/// Outer loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Pause between cycles in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/114.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn random_delay() -> u64 {
        5000
    }
    pub fn max_concurrent() -> usize {
        2
    }
    pub fn max_pages() -> usize {
        100
    }

    // Thread defaults
    pub fn url_template() -> String {
        "https://www.mygarage.ro/componente/110958-cele-mai-bune-oferte-ale-zilei-cititi-regula-din-primul-post-inainte-sa-postati-{page}.html".into()
    }
    pub fn allowed_domains() -> Vec<String> {
        vec!["www.mygarage.ro".into()]
    }

    // Storage defaults
    pub fn record_path() -> PathBuf {
        PathBuf::from("persist.json")
    }
    pub fn lock_timeout() -> u64 {
        5000
    }

    pub fn interval() -> u64 {
        120
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.thread.url_template = "https://forum.example/thread.html".to_string();
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.thread.selectors.post_selector = "[[invalid".to_string();
        assert!(matches!(config.validate(), Err(AppError::Selector { .. })));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn page_url_substitutes_placeholder() {
        let thread = ThreadConfig {
            url_template: "https://forum.example/deals-{page}.html".into(),
            ..ThreadConfig::default()
        };
        assert_eq!(thread.page_url("42"), "https://forum.example/deals-42.html");
    }

    #[test]
    fn allowed_host_is_case_insensitive() {
        let thread = ThreadConfig::default();
        assert!(thread.is_allowed_host("WWW.MyGarage.ro"));
        assert!(!thread.is_allowed_host("mygarage.ro.evil.example"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [thread]
            url_template = "https://forum.example/t-{page}.html"
            allowed_domains = ["forum.example"]

            [schedule]
            interval_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.schedule.interval_secs, 30);
        assert_eq!(config.crawler.max_concurrent, 2);
        assert_eq!(config.storage.record_path, PathBuf::from("persist.json"));
        assert_eq!(config.thread.selectors.post_selector, ".ppost");
        assert!(config.validate().is_ok());
    }
}
