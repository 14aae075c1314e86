// src/pipeline/aggregate.rs

//! Grouping of crawled posts by thread page.
//!
//! The page number always comes from the item's source URL, never from the
//! order pages were crawled in: retries and parallel fetches make crawl order
//! meaningless.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{Item, Page, PageNumber, Window};

static PAGE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.html$").expect("page suffix pattern is valid"));

/// Parse the page number from a locator such as `.../thread-title-42.html`.
///
/// Query strings and fragments are ignored.
pub fn page_number(locator: &str) -> Result<PageNumber> {
    let path = match url::Url::parse(locator) {
        Ok(url) => url.path().to_string(),
        Err(_) => locator
            .split(['?', '#'])
            .next()
            .unwrap_or(locator)
            .to_string(),
    };

    PAGE_SUFFIX
        .captures(&path)
        .and_then(|caps| caps.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
        .ok_or_else(|| AppError::malformed_locator(locator))
}

/// Group items by page number, keeping encounter order within each page.
pub fn aggregate(items: Vec<Item>) -> Result<BTreeMap<PageNumber, Page<Item>>> {
    let mut pages: BTreeMap<PageNumber, Page<Item>> = BTreeMap::new();
    for item in items {
        let number = page_number(item.source())?;
        pages.entry(number).or_default().items.push(item);
    }
    Ok(pages)
}

/// Aggregate a full crawl and cut it down to the trailing window.
///
/// Also returns every aggregated page so callers can inspect what fell
/// outside the window.
pub fn build_window(items: Vec<Item>) -> Result<(Window, BTreeMap<PageNumber, Page<Item>>)> {
    let pages = aggregate(items)?;
    let window = Window::from_pages(pages.clone());
    log::debug!(
        "Aggregated {} pages; window covers {:?}",
        pages.len(),
        window.pages().keys().collect::<Vec<_>>()
    );
    Ok((window, pages))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.mygarage.ro/componente/110958-cele-mai-bune-oferte";

    fn item(text: &str, page: u32) -> Item {
        Item::new(text, format!("{BASE}-{page}.html"))
    }

    #[test]
    fn test_page_number_from_url() {
        assert_eq!(page_number(&format!("{BASE}-2431.html")).unwrap(), 2431);
    }

    #[test]
    fn test_page_number_ignores_query_and_fragment() {
        assert_eq!(
            page_number("https://forum.example/t-17.html?highlight=ssd#post9").unwrap(),
            17
        );
    }

    #[test]
    fn test_page_number_plain_locator() {
        assert_eq!(page_number("thread-3.html").unwrap(), 3);
    }

    #[test]
    fn test_page_number_rejects_missing_suffix() {
        for locator in [
            "https://forum.example/thread.html",
            "https://forum.example/thread-12.php",
            "https://forum.example/thread-12.html/extra",
            "",
        ] {
            assert!(
                matches!(page_number(locator), Err(AppError::MalformedLocator { .. })),
                "{locator} should be rejected"
            );
        }
    }

    #[test]
    fn test_page_number_rejects_overflow() {
        assert!(page_number("https://forum.example/t-99999999999.html").is_err());
    }

    #[test]
    fn test_aggregate_groups_by_locator_not_order() {
        let items = vec![item("c", 5), item("a", 4), item("d", 5), item("b", 4)];
        let pages = aggregate(items).unwrap();

        let texts = |n: u32| -> Vec<&str> { pages[&n].items.iter().map(Item::text).collect() };
        assert_eq!(texts(4), vec!["a", "b"]);
        assert_eq!(texts(5), vec!["c", "d"]);
    }

    #[test]
    fn test_aggregate_aborts_on_malformed_locator() {
        let items = vec![item("ok", 4), Item::new("bad", "https://forum.example/index.php")];
        assert!(matches!(
            aggregate(items),
            Err(AppError::MalformedLocator { locator }) if locator.ends_with("index.php")
        ));
    }

    #[test]
    fn test_build_window_returns_all_pages() {
        let items = vec![item("a", 3), item("b", 4), item("c", 5)];
        let (window, all) = build_window(items).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(window.pages().len(), 2);
        assert_eq!(window.last_page(), Some(5));
    }
}
