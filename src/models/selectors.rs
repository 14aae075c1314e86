// src/models/selectors.rs

//! CSS selectors for scraping a thread page.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping a thread page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSelectors {
    /// Selector for each post container on a page
    #[serde(default = "default_post_selector")]
    pub post_selector: String,

    /// Selector for the message body within a post
    #[serde(default = "default_text_selector")]
    pub text_selector: String,

    /// Selector for the "next page" link
    #[serde(default = "default_next_selector")]
    pub next_selector: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub attr_name: String,
}

fn default_post_selector() -> String {
    ".ppost".to_string()
}

fn default_text_selector() -> String {
    "[id^=post_message]".to_string()
}

fn default_next_selector() -> String {
    "[rel=next]".to_string()
}

fn default_attr_name() -> String {
    "href".to_string()
}

impl Default for ThreadSelectors {
    fn default() -> Self {
        Self {
            post_selector: default_post_selector(),
            text_selector: default_text_selector(),
            next_selector: default_next_selector(),
            attr_name: default_attr_name(),
        }
    }
}

impl ThreadSelectors {
    /// All selector strings, labelled, for validation.
    pub fn labelled(&self) -> [(&'static str, &str); 3] {
        [
            ("post_selector", &self.post_selector),
            ("text_selector", &self.text_selector),
            ("next_selector", &self.next_selector),
        ]
    }
}
