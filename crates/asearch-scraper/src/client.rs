use std::time::Duration;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION,
};

use crate::error::SearchError;

/// The target site serves degraded markup (or blocks outright) for clients
/// that do not look like a browser, so every request carries this full
/// header set.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/111.0";

/// HTTP client for search results pages.
///
/// Owns one `reqwest::Client` (connection pool + cookie store) for the
/// process lifetime; all concurrent page fetches share it. Non-2xx
/// responses are translated into [`SearchError::FetchFailed`] carrying the
/// plain text of the error body.
///
/// No retry is attempted; callers treat a failed fetch as terminal for
/// that page.
pub struct FetchClient {
    client: reqwest::Client,
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers
}

impl FetchClient {
    /// Creates a `FetchClient` with the browser header set, a cookie store,
    /// and the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(timeout_secs: u64) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches one search results page: `{origin}/s?k={query}` plus a
    /// `page` parameter for pages after the first.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Http`] on transport failure (connect, timeout,
    ///   body read).
    /// - [`SearchError::FetchFailed`] on a non-2xx status; the message is
    ///   the error body flattened to plain text.
    pub async fn fetch_search_page(
        &self,
        origin: &str,
        query: &str,
        page: Option<u32>,
    ) -> Result<String, SearchError> {
        let url = format!("{origin}/s");
        let mut request = self.client.get(&url).query(&[("k", query)]);
        if let Some(page) = page {
            request = request.query(&[("page", page.to_string())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::FetchFailed {
                page: page.unwrap_or(1),
                status: status.as_u16(),
                message: html_to_text(&body),
            });
        }

        Ok(response.text().await?)
    }
}

/// Flattens an HTML error body into whitespace-normalized plain text.
///
/// Falls back to the trimmed raw body when the document carries no text
/// at all.
fn html_to_text(body: &str) -> String {
    let document = scraper::Html::parse_document(body);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        body.trim().to_owned()
    } else {
        collapsed
    }
}
