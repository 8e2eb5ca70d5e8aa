//! Paginated concurrent search pipeline.
//!
//! Page 1 is fetched once and serves double duty: it carries both the
//! first page's records and the pagination marker the page plan is built
//! from. Pages 2..=N then fan out concurrently; each page is fetched and
//! extracted independently so one bad page cannot corrupt another. Page
//! outcomes are collected in full before the overall result is decided,
//! which keeps the surfaced failure deterministic even though completion
//! order is not.

use asearch_core::{Country, MalformedItemPolicy, ProductRecord, MAX_PAGES};
use futures::stream::{self, StreamExt};

use crate::client::FetchClient;
use crate::error::SearchError;
use crate::extract::{extract_records, parse_page_count};

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub request_timeout_secs: u64,
    /// Upper bound on concurrently in-flight page fetches. The page plan
    /// is already capped at [`MAX_PAGES`], so the default admits every
    /// remaining page at once.
    pub max_concurrent_pages: usize,
    pub malformed_item_policy: MalformedItemPolicy,
    /// Joins heading fragments into one description.
    pub description_separator: String,
    /// Overrides the `https://amazon.<suffix>` origin. Lets tests and
    /// proxies point the pipeline at a different host; the country still
    /// determines `detail_url` domains.
    pub base_url: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_concurrent_pages: (MAX_PAGES - 1) as usize,
            malformed_item_policy: MalformedItemPolicy::Abort,
            description_separator: ": ".to_owned(),
            base_url: None,
        }
    }
}

/// Drives the full scrape-and-parse pipeline for one search.
pub struct SearchClient {
    fetch: FetchClient,
    config: SearchConfig,
}

impl SearchClient {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let fetch = FetchClient::new(config.request_timeout_secs)?;
        Ok(Self { fetch, config })
    }

    /// Runs one paginated search and aggregates all page records.
    ///
    /// Within a page, record order follows document order; across pages no
    /// order is guaranteed beyond page 1 coming first. Records recurring
    /// across pages are not deduplicated.
    ///
    /// # Errors
    ///
    /// - [`SearchError::PaginationParseFailed`] if page 1 carries no
    ///   parseable pagination marker.
    /// - [`SearchError::FetchFailed`] / [`SearchError::Http`] if any page
    ///   fetch failed; terminal for the whole search.
    /// - [`SearchError::ExtractionFailed`] for a malformed result element
    ///   under [`MalformedItemPolicy::Abort`].
    pub async fn search(
        &self,
        query: &str,
        country: Country,
    ) -> Result<Vec<ProductRecord>, SearchError> {
        let site = country.site();
        let origin = self
            .config
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{site}"));

        let first_page = self.fetch.fetch_search_page(&origin, query, None).await?;
        let pages = parse_page_count(&first_page)
            .ok_or(SearchError::PaginationParseFailed)?
            .min(MAX_PAGES);
        tracing::debug!(query, country = %country, pages, "resolved page plan");

        let mut records = self.extract_page(&first_page, &site, 1)?;
        if pages <= 1 {
            return Ok(records);
        }

        let origin = origin.as_str();
        let site_ref = site.as_str();
        let concurrency = self.config.max_concurrent_pages.max(1);
        let mut outcomes: Vec<(u32, Result<Vec<ProductRecord>, SearchError>)> =
            stream::iter(2..=pages)
                .map(move |page| async move {
                    let outcome = self.fetch_and_extract(origin, query, site_ref, page).await;
                    (page, outcome)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        // Completion order is nondeterministic; sort so the error surfaced
        // on failure is always the lowest-numbered page's.
        outcomes.sort_unstable_by_key(|(page, _)| *page);
        for (page, outcome) in outcomes {
            match outcome {
                Ok(page_records) => records.extend(page_records),
                Err(e) => {
                    tracing::warn!(page, error = %e, "page failed, aborting search");
                    return Err(e);
                }
            }
        }

        tracing::debug!(query, total = records.len(), "search aggregated");
        Ok(records)
    }

    async fn fetch_and_extract(
        &self,
        origin: &str,
        query: &str,
        site: &str,
        page: u32,
    ) -> Result<Vec<ProductRecord>, SearchError> {
        let html = self
            .fetch
            .fetch_search_page(origin, query, Some(page))
            .await?;
        self.extract_page(&html, site, page)
    }

    /// Applies the malformed-item policy to one page's element results.
    fn extract_page(
        &self,
        html: &str,
        site: &str,
        page: u32,
    ) -> Result<Vec<ProductRecord>, SearchError> {
        let mut records = Vec::new();
        for item in extract_records(html, site, &self.config.description_separator) {
            match item {
                Ok(record) => records.push(record),
                Err(source) => match self.config.malformed_item_policy {
                    MalformedItemPolicy::Abort => {
                        return Err(SearchError::ExtractionFailed { page, source });
                    }
                    MalformedItemPolicy::Skip => {
                        tracing::warn!(page, error = %source, "skipping malformed result element");
                    }
                },
            }
        }
        Ok(records)
    }
}
