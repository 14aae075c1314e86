// src/services/thread.rs

//! Thread crawler service.
//!
//! Walks a forum thread from a start page by following "next page" links,
//! extracting the text of every post on the way.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Config, FetchOutcome, Item};
use crate::services::Fetcher;
use crate::utils::{get_domain, http, resolve_url};

/// Posts and outgoing "next" links of one fetched page.
#[derive(Debug, Default)]
struct PageScrape {
    items: Vec<Item>,
    next: Vec<Url>,
}

/// Service for crawling a paginated thread.
pub struct ThreadCrawler {
    config: Arc<Config>,
    client: Client,
    post_sel: Selector,
    text_sel: Selector,
    next_sel: Selector,
}

impl ThreadCrawler {
    /// Create a new thread crawler with the given configuration.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = http::create_async_client(&config.crawler)?;
        Self::with_client(config, client)
    }

    /// Create a crawler around an existing HTTP client.
    pub fn with_client(config: Arc<Config>, client: Client) -> Result<Self> {
        let selectors = &config.thread.selectors;
        let post_sel = Self::parse_selector(&selectors.post_selector)?;
        let text_sel = Self::parse_selector(&selectors.text_selector)?;
        let next_sel = Self::parse_selector(&selectors.next_selector)?;

        Ok(Self {
            config,
            client,
            post_sel,
            text_sel,
            next_sel,
        })
    }

    /// Fetch a single page and scrape it.
    async fn fetch_page(&self, url: &Url) -> Result<(Url, PageScrape)> {
        self.polite_delay().await;
        log::info!("Visiting {}", url);

        let (final_url, html) = http::fetch_text(&self.client, url.as_str())
            .await
            .map_err(|e| AppError::crawl(url.as_str(), e))?;
        let scrape = self.parse_page(&final_url, &html);
        Ok((final_url, scrape))
    }

    /// Extract posts and next-page links from a page's HTML.
    fn parse_page(&self, page_url: &Url, html: &str) -> PageScrape {
        let document = Html::parse_document(html);
        let mut scrape = PageScrape::default();

        for post in document.select(&self.post_sel) {
            let text: String = post
                .select(&self.text_sel)
                .flat_map(|el| el.text())
                .collect::<String>()
                .trim()
                .to_string();

            if text.is_empty() {
                log::debug!("Skipping post without message text on {}", page_url);
                continue;
            }
            scrape.items.push(Item::new(text, page_url.as_str()));
        }

        let attr = &self.config.thread.selectors.attr_name;
        for link in document.select(&self.next_sel) {
            let Some(href) = link.value().attr(attr) else {
                continue;
            };
            match resolve_url(page_url, href) {
                Some(next) if self.is_allowed(&next) => scrape.next.push(next),
                Some(next) => log::debug!("Not following {} (domain not allowed)", next),
                None => log::debug!("Ignoring unparseable next link '{}'", href),
            }
        }

        scrape
    }

    fn is_allowed(&self, url: &Url) -> bool {
        get_domain(url).is_some_and(|host| self.config.thread.is_allowed_host(&host))
    }

    /// Sleep a random time up to `random_delay_ms`.
    async fn polite_delay(&self) {
        let max = self.config.crawler.random_delay_ms;
        if max == 0 {
            return;
        }
        let millis = rand::thread_rng().gen_range(0..=max);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

#[async_trait]
impl Fetcher for ThreadCrawler {
    async fn fetch(&self, start_url: &str) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();

        let start = match Url::parse(start_url) {
            Ok(url) if self.is_allowed(&url) => url,
            Ok(url) => {
                log::warn!("Start URL {} is not on an allowed domain", url);
                outcome.page_failures += 1;
                return outcome;
            }
            Err(e) => {
                log::warn!("Invalid start URL {}: {}", start_url, e);
                outcome.page_failures += 1;
                return outcome;
            }
        };

        let concurrency = self.config.crawler.max_concurrent.max(1);
        let max_pages = self.config.crawler.max_pages;
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![start];
        let mut capped = false;

        while !frontier.is_empty() && !capped {
            // Redirect targets land in `visited` too, so the budget counts
            // requests rather than visited URLs.
            let budget = max_pages.saturating_sub(outcome.pages_fetched + outcome.page_failures);
            let mut wave: Vec<Url> = Vec::new();
            for url in frontier.drain(..) {
                if visited.contains(url.as_str()) {
                    continue;
                }
                if wave.len() == budget {
                    log::warn!("Stopped after {} pages (crawler.max_pages)", max_pages);
                    capped = true;
                    break;
                }
                visited.insert(url.to_string());
                wave.push(url);
            }
            if wave.is_empty() {
                break;
            }

            // Results are put back in discovery order once the wave completes.
            let mut results: Vec<_> = stream::iter(wave.into_iter().enumerate())
                .map(|(idx, url)| async move {
                    let result = self.fetch_page(&url).await;
                    (idx, url, result)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
            results.sort_by_key(|(idx, _, _)| *idx);

            for (_, url, result) in results {
                match result {
                    Ok((final_url, scrape)) => {
                        outcome.pages_fetched += 1;
                        visited.insert(final_url.to_string());
                        log::debug!("{}: {} posts", final_url, scrape.items.len());
                        outcome.items.extend(scrape.items);
                        frontier.extend(
                            scrape
                                .next
                                .into_iter()
                                .filter(|next| !visited.contains(next.as_str())),
                        );
                    }
                    Err(error) => {
                        outcome.page_failures += 1;
                        log::warn!("Failed to fetch page {}: {}", url, error);
                    }
                }
            }
        }

        log::info!(
            "Crawl finished: {} pages, {} failures, {} posts",
            outcome.pages_fetched,
            outcome.page_failures,
            outcome.items.len()
        );
        outcome
    }
}
