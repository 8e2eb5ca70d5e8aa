//! Tolerant record extraction from one search results page.
//!
//! The page template is fixed: each listing is a
//! `div[data-component-type="s-search-result"]` container and the total
//! page count sits in the last `span.s-pagination-item`. Extraction of one
//! container is independent of its siblings; each yields a
//! `Result<ProductRecord, ExtractError>` and the caller decides whether a
//! malformed element aborts the page or is skipped.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use asearch_core::{detail_url, ProductRecord};

use crate::error::ExtractError;

struct Selectors {
    container: Selector,
    pagination_item: Selector,
    image: Selector,
    heading: Selector,
    price: Selector,
    price_offscreen: Selector,
    labelled_span: Selector,
    reviews_link: Selector,
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    container: sel(r#"div[data-component-type="s-search-result"]"#),
    pagination_item: sel("span.s-pagination-item"),
    image: sel("img.s-image"),
    heading: sel("h2"),
    price: sel("span.a-price"),
    price_offscreen: sel("span.a-offscreen"),
    labelled_span: sel("span[aria-label]"),
    reviews_link: sel(r##"a[href$="#customerReviews"]"##),
});

/// Accessibility label carried by the rating element, e.g.
/// `"4.5 out of 5 stars"`. Trailing text ("... and up") is tolerated.
static RATING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?) out of \d+(?:\.\d+)? stars").expect("valid regex")
});

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Parses the total page count from the last pagination marker on a
/// results page.
///
/// Returns `None` when no pagination marker is present or the last
/// marker's text is not an integer.
#[must_use]
pub fn parse_page_count(html: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let last = document.select(&SELECTORS.pagination_item).last()?;
    element_text(last).parse().ok()
}

/// Extracts one result per container element found in `html`, in document
/// order.
///
/// Returns an empty vector (after logging a snapshot of the page) when no
/// container elements are detected; a fetched-but-empty page is not an
/// error. A malformed container yields an `Err` item without affecting
/// its siblings.
#[must_use]
pub fn extract_records(
    html: &str,
    site: &str,
    separator: &str,
) -> Vec<Result<ProductRecord, ExtractError>> {
    let document = Html::parse_document(html);
    let containers: Vec<ElementRef<'_>> = document.select(&SELECTORS.container).collect();

    if containers.is_empty() {
        tracing::error!(
            snippet = truncate(html, 2048),
            "no result containers found in page HTML"
        );
        return Vec::new();
    }

    containers
        .into_iter()
        .map(|div| extract_record(div, site, separator))
        .collect()
}

fn extract_record(
    div: ElementRef<'_>,
    site: &str,
    separator: &str,
) -> Result<ProductRecord, ExtractError> {
    let asin = div
        .value()
        .attr("data-asin")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ExtractError::MissingAsin {
            snippet: snippet_of(div),
        })?
        .to_owned();

    let image_url = div
        .select(&SELECTORS.image)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_owned);

    let description = div
        .select(&SELECTORS.heading)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator);
    if description.is_empty() {
        return Err(ExtractError::MissingDescription {
            asin,
            snippet: snippet_of(div),
        });
    }

    let price = parse_price(div, &asin)?;
    let rating = parse_rating(div, &asin)?;
    let review_count = parse_review_count(div, &asin)?;

    Ok(ProductRecord {
        detail_url: detail_url(site, &asin),
        asin,
        image_url,
        description,
        price,
        rating,
        review_count,
    })
}

/// Price, when a price element is present: the off-screen textual
/// representation minus the currency symbol, parsed as a decimal.
fn parse_price(div: ElementRef<'_>, asin: &str) -> Result<Option<Decimal>, ExtractError> {
    let Some(price_el) = div.select(&SELECTORS.price).next() else {
        return Ok(None);
    };
    let Some(offscreen) = price_el.select(&SELECTORS.price_offscreen).next() else {
        return Ok(None);
    };

    let text = element_text(offscreen);
    text.replace('$', "")
        .parse::<Decimal>()
        .map(Some)
        .map_err(|_| ExtractError::InvalidField {
            asin: asin.to_owned(),
            field: "price",
            value: text,
        })
}

/// Rating, when any span carries an aria-label matching the
/// `<n> out of <m> stars` pattern: the leading number as a float.
fn parse_rating(div: ElementRef<'_>, asin: &str) -> Result<Option<f64>, ExtractError> {
    for span in div.select(&SELECTORS.labelled_span) {
        let Some(label) = span.value().attr("aria-label") else {
            continue;
        };
        let Some(caps) = RATING_LABEL.captures(label) else {
            continue;
        };
        let value = caps[1]
            .parse::<f64>()
            .map_err(|_| ExtractError::InvalidField {
                asin: asin.to_owned(),
                field: "rating",
                value: label.to_owned(),
            })?;
        return Ok(Some(value));
    }
    Ok(None)
}

/// Review count, when a link targeting the reviews fragment is present:
/// its text minus thousands separators and parenthesis decoration.
fn parse_review_count(div: ElementRef<'_>, asin: &str) -> Result<Option<u64>, ExtractError> {
    let Some(anchor) = div.select(&SELECTORS.reviews_link).next() else {
        return Ok(None);
    };

    let text = element_text(anchor);
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')'))
        .collect();
    cleaned
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ExtractError::InvalidField {
            asin: asin.to_owned(),
            field: "review_count",
            value: text,
        })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

fn snippet_of(div: ElementRef<'_>) -> String {
    truncate(&div.html(), 256).to_owned()
}

/// Truncates to at most `max_bytes`, snapping down to a char boundary.
fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
