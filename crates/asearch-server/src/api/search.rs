use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;

use asearch_core::{Country, SearchRequest, UnknownCountryError};
use asearch_scraper::SearchError;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    q: Option<String>,
    country: Option<String>,
}

/// `GET /api/v1/search?q=<query>&country=<CA|US>`
///
/// Validates the parameters, then resolves the search through the request
/// cache: concurrent identical queries share one pipeline execution and
/// repeats within the TTL are served without touching the upstream site.
pub(super) async fn run_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "query parameter \"q\" is required",
        ));
    }

    let country = match params.country.as_deref() {
        None => Country::Ca,
        Some(raw) => raw.parse().map_err(|e: UnknownCountryError| {
            ApiError::new(req_id.0.clone(), "unknown_country", e.to_string())
        })?,
    };

    let request = SearchRequest {
        query: query.to_owned(),
        country,
    };
    let client = Arc::clone(&state.client);
    let owned_query = query.to_owned();
    let outcome = state
        .cache
        .get_or_compute(request, async move {
            client.search(&owned_query, country).await
        })
        .await;

    match outcome {
        Ok(records) => Ok(Json(ApiResponse {
            data: records.as_ref().clone(),
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => {
            tracing::error!(query, country = %country, error = %e, "search pipeline failed");
            Err(map_search_error(req_id.0, &e))
        }
    }
}

fn map_search_error(request_id: String, e: &SearchError) -> ApiError {
    match e {
        SearchError::UnknownCountry(_) => ApiError::new(request_id, "unknown_country", e.to_string()),
        _ => ApiError::new(request_id, "upstream_error", e.to_string()),
    }
}
