//! Integration tests for `SearchClient::search`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no
//! real network traffic is made. Covers the happy paths (single page,
//! multi-page fan-out), the pagination clamp, and every failure mode the
//! pipeline can surface.

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use asearch_core::{Country, MalformedItemPolicy};
use asearch_scraper::{SearchClient, SearchConfig, SearchError};

fn test_client(base_url: String) -> SearchClient {
    SearchClient::new(SearchConfig {
        request_timeout_secs: 5,
        base_url: Some(base_url),
        ..SearchConfig::default()
    })
    .expect("failed to build test SearchClient")
}

fn test_client_with_policy(base_url: String, policy: MalformedItemPolicy) -> SearchClient {
    SearchClient::new(SearchConfig {
        request_timeout_secs: 5,
        malformed_item_policy: policy,
        base_url: Some(base_url),
        ..SearchConfig::default()
    })
    .expect("failed to build test SearchClient")
}

/// One complete result-container element with every optional field set.
fn item(asin: &str) -> String {
    format!(
        r##"<div data-component-type="s-search-result" data-asin="{asin}">
            <img class="s-image" src="https://img.example/{asin}.jpg">
            <h2><a><span>Widget {asin}</span></a></h2>
            <span class="a-price"><span class="a-offscreen">$19.99</span></span>
            <span aria-label="4.5 out of 5 stars"></span>
            <a href="/dp/{asin}/#customerReviews">(1,234)</a>
        </div>"##
    )
}

/// Container missing its heading, which makes it a malformed element.
fn malformed_item(asin: &str) -> String {
    format!(r#"<div data-component-type="s-search-result" data-asin="{asin}"><span>no heading</span></div>"#)
}

/// A results page with the given items and a pagination marker reporting
/// `total_pages`.
fn results_page(total_pages: u32, items: &[String]) -> String {
    format!(
        r#"<html><body>{}<span class="s-pagination-item">{total_pages}</span></body></html>"#,
        items.join("\n")
    )
}

fn html_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_page_search_returns_all_records() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("k", "widget"))
        .and(query_param_is_missing("page"))
        .respond_with(html_response(results_page(
            1,
            &[item("B000000001"), item("B000000002"), item("B000000003")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let records = client.search("widget", Country::Ca).await.expect("search");

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].asin, "B000000001");
    assert_eq!(records[0].description, "Widget B000000001");
    assert_eq!(records[0].detail_url, "https://amazon.ca/dp/B000000001");
    assert_eq!(records[0].price, Some("19.99".parse().unwrap()));
    assert_eq!(records[0].rating, Some(4.5));
    assert_eq!(records[0].review_count, Some(1234));
}

#[tokio::test]
async fn multi_page_search_aggregates_every_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param_is_missing("page"))
        .respond_with(html_response(results_page(
            3,
            &[item("B000000001"), item("B000000002")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(html_response(results_page(3, &[item("B000000003")])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "3"))
        .respond_with(html_response(results_page(
            3,
            &[item("B000000004"), item("B000000005")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let records = client.search("widget", Country::Ca).await.expect("search");

    assert_eq!(records.len(), 5, "2 + 1 + 2 records merged across pages");
    let mut asins: Vec<&str> = records.iter().map(|r| r.asin.as_str()).collect();
    asins.sort_unstable();
    assert_eq!(
        asins,
        vec![
            "B000000001",
            "B000000002",
            "B000000003",
            "B000000004",
            "B000000005"
        ]
    );
}

#[tokio::test]
async fn page_plan_is_clamped_to_fifty_pages() {
    let server = MockServer::start().await;

    // Page 1 reports 75 pages; it must be fetched exactly once.
    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param_is_missing("page"))
        .respond_with(html_response(results_page(75, &[item("B000000001")])))
        .expect(1)
        .mount(&server)
        .await;

    // Every later page serves one record.
    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html_response(results_page(75, &[item("B000000002")])))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let records = client.search("widget", Country::Ca).await.expect("search");

    assert_eq!(records.len(), 50, "1 record from page 1 + 49 fanned-out pages");
    let requests = server.received_requests().await.expect("request recording");
    assert_eq!(requests.len(), 50, "pages 51..75 must never be requested");
}

#[tokio::test]
async fn page_without_result_containers_contributes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param_is_missing("page"))
        .respond_with(html_response(results_page(2, &[item("B000000001")])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(html_response(results_page(2, &[])))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let records = client.search("widget", Country::Ca).await.expect("search");

    assert_eq!(records.len(), 1, "empty page is not an error");
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_pagination_marker_fails_the_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html_response(
            "<html><body><div>no pagination here</div></body></html>".to_owned(),
        ))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let result = client.search("widget", Country::Ca).await;

    assert!(
        matches!(result, Err(SearchError::PaginationParseFailed)),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn non_success_status_surfaces_plain_text_from_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(ResponseTemplate::new(503).set_body_raw(
            "<html><body><h1>Robot Check</h1><p>Try again later.</p></body></html>",
            "text/html",
        ))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let result = client.search("widget", Country::Ca).await;

    match result {
        Err(SearchError::FetchFailed {
            page,
            status,
            message,
        }) => {
            assert_eq!(page, 1);
            assert_eq!(status, 503);
            assert!(message.contains("Robot Check"), "message: {message}");
            assert!(!message.contains('<'), "markup must be stripped: {message}");
        }
        other => panic!("expected FetchFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn failing_page_aborts_the_whole_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param_is_missing("page"))
        .respond_with(html_response(results_page(2, &[item("B000000001")])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500).set_body_raw("internal error", "text/plain"))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let result = client.search("widget", Country::Ca).await;

    match result {
        Err(SearchError::FetchFailed { page, status, .. }) => {
            assert_eq!(page, 2);
            assert_eq!(status, 500);
        }
        other => panic!("expected FetchFailed for page 2, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_element_aborts_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html_response(results_page(
            1,
            &[
                item("B000000001"),
                malformed_item("B000000002"),
                item("B000000003"),
            ],
        )))
        .mount(&server)
        .await;

    let client = test_client(server.uri());
    let result = client.search("widget", Country::Ca).await;

    match result {
        Err(SearchError::ExtractionFailed { page, source }) => {
            assert_eq!(page, 1);
            assert!(source.to_string().contains("B000000002"), "source: {source}");
        }
        other => panic!("expected ExtractionFailed, got: {other:?}"),
    }
}

#[tokio::test]
async fn skip_policy_keeps_the_well_formed_elements() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/s"))
        .respond_with(html_response(results_page(
            1,
            &[
                item("B000000001"),
                malformed_item("B000000002"),
                item("B000000003"),
            ],
        )))
        .mount(&server)
        .await;

    let client = test_client_with_policy(server.uri(), MalformedItemPolicy::Skip);
    let records = client.search("widget", Country::Ca).await.expect("search");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].asin, "B000000001");
    assert_eq!(records[1].asin, "B000000003");
}
