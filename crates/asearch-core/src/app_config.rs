use std::net::SocketAddr;

/// Policy applied when a result element fails extraction (missing ASIN or
/// heading text).
///
/// `Abort` fails the whole search on the first malformed element, matching
/// the reference scraper. `Skip` logs the element and keeps the rest of
/// the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedItemPolicy {
    Abort,
    Skip,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Seconds a completed search result stays cached before recompute.
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    /// Upper bound on concurrently in-flight page fetches per search.
    pub max_concurrent_pages: usize,
    pub malformed_item_policy: MalformedItemPolicy,
    /// Separator used when a result element carries multiple heading
    /// fragments.
    pub description_separator: String,
}
