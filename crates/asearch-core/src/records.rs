use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling on the number of result pages fetched for one search.
/// Bounds fan-out against the upstream site regardless of how many pages
/// its pagination markup reports.
pub const MAX_PAGES: u32 = 50;

/// Country site a search runs against. Each variant maps to a fixed
/// domain suffix (`amazon.ca` / `amazon.com`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "CA")]
    Ca,
    #[serde(rename = "US")]
    Us,
}

impl Country {
    #[must_use]
    pub fn domain_suffix(self) -> &'static str {
        match self {
            Country::Ca => "ca",
            Country::Us => "com",
        }
    }

    /// Site hostname for this country, e.g. `amazon.ca`.
    #[must_use]
    pub fn site(self) -> String {
        format!("amazon.{}", self.domain_suffix())
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Country::Ca => "CA",
            Country::Us => "US",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for country codes outside the supported CA/US table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown country code: {0}")]
pub struct UnknownCountryError(pub String);

impl FromStr for Country {
    type Err = UnknownCountryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("CA") {
            Ok(Country::Ca)
        } else if s.eq_ignore_ascii_case("US") {
            Ok(Country::Us)
        } else {
            Err(UnknownCountryError(s.to_owned()))
        }
    }
}

/// Immutable key identifying one logical search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub query: String,
    pub country: Country,
}

/// One product listing scraped from a search results page.
///
/// `asin` and `description` are present on every successfully extracted
/// record; every other field is independently optional. An ASIN is unique
/// on the site but may recur within one result set when the site repeats
/// an item across pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub asin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub description: String,
    pub detail_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
}

/// Builds the product detail URL for an ASIN on a given site host.
///
/// This is the only way a `detail_url` is produced; it is a pure function
/// of the ASIN and the site and is never stored independently of them.
#[must_use]
pub fn detail_url(site: &str, asin: &str) -> String {
    format!("https://{site}/dp/{asin}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_parses_known_codes_case_insensitively() {
        assert_eq!("CA".parse::<Country>().unwrap(), Country::Ca);
        assert_eq!("us".parse::<Country>().unwrap(), Country::Us);
    }

    #[test]
    fn country_rejects_unknown_code() {
        let err = "MX".parse::<Country>().unwrap_err();
        assert_eq!(err, UnknownCountryError("MX".to_owned()));
        assert_eq!(err.to_string(), "unknown country code: MX");
    }

    #[test]
    fn country_maps_to_site_domain() {
        assert_eq!(Country::Ca.site(), "amazon.ca");
        assert_eq!(Country::Us.site(), "amazon.com");
    }

    #[test]
    fn detail_url_is_derived_from_site_and_asin() {
        assert_eq!(
            detail_url("amazon.ca", "B000TESTID"),
            "https://amazon.ca/dp/B000TESTID"
        );
    }

    #[test]
    fn product_record_omits_absent_optional_fields() {
        let record = ProductRecord {
            asin: "B000TESTID".to_owned(),
            image_url: None,
            description: "Widget".to_owned(),
            detail_url: detail_url("amazon.ca", "B000TESTID"),
            price: None,
            rating: None,
            review_count: None,
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert!(json.get("price").is_none(), "absent price must be omitted");
        assert!(json.get("rating").is_none());
        assert!(json.get("review_count").is_none());
        assert_eq!(json["asin"], "B000TESTID");
    }

    #[test]
    fn product_record_serializes_price_as_string() {
        let record = ProductRecord {
            asin: "B000TESTID".to_owned(),
            image_url: Some("https://img.example/1.jpg".to_owned()),
            description: "Widget".to_owned(),
            detail_url: detail_url("amazon.com", "B000TESTID"),
            price: Some("19.99".parse().unwrap()),
            rating: Some(4.5),
            review_count: Some(1234),
        };
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["price"], "19.99");
        assert_eq!(json["review_count"], 1234);
    }
}
