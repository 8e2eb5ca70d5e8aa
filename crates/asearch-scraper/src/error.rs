use asearch_core::UnknownCountryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed for page {page} with status {status}: {message}")]
    FetchFailed {
        page: u32,
        status: u16,
        /// Plain text extracted from the (possibly HTML) error body, so
        /// callers get a human-diagnosable message rather than raw markup.
        message: String,
    },

    #[error("extraction failed on page {page}: {source}")]
    ExtractionFailed {
        page: u32,
        #[source]
        source: ExtractError,
    },

    #[error("could not parse total page count from pagination markup")]
    PaginationParseFailed,

    #[error(transparent)]
    UnknownCountry(#[from] UnknownCountryError),
}

/// Failure extracting a single result-container element.
///
/// A missing ASIN or heading is a hard per-element failure; everything
/// else on a result element is optional and simply absent when missing.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("result element is missing its data-asin attribute: {snippet}")]
    MissingAsin { snippet: String },

    #[error("result element {asin} has no heading text: {snippet}")]
    MissingDescription { asin: String, snippet: String },

    #[error("could not parse {field} from {value:?} on element {asin}")]
    InvalidField {
        asin: String,
        field: &'static str,
        value: String,
    },
}
