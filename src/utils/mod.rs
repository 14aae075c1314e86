//! Utility functions and helpers.

pub mod http;
pub mod log;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Extract the lowercase host from a URL.
pub fn get_domain(url: &Url) -> Option<String> {
    url.host_str().map(|s| s.to_ascii_lowercase())
}
