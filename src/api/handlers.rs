//! Request handlers
//!
//! `POST /store?url=...` hands the URL to the ingestion pool without waiting
//! for it to be processed. `GET /urls` lists stored records.

use crate::api::AppState;
use crate::record::UrlRecord;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use url::Url;

/// Maximum number of records returned by `GET /urls`
pub const MAX_LISTED_URLS: usize = 50;

#[derive(Debug, Deserialize)]
pub struct StoreParams {
    pub url: Option<String>,
}

pub async fn health() -> &'static str {
    "ok"
}

/// Enqueues a URL for ingestion
pub async fn store_url(
    State(state): State<AppState>,
    Query(params): Query<StoreParams>,
) -> Response {
    let Some(url) = params.url.filter(|u| !u.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "path must contain url query param").into_response();
    };

    if !is_fetchable(&url) {
        return (
            StatusCode::BAD_REQUEST,
            "url must be an absolute http or https URL",
        )
            .into_response();
    }

    tracing::debug!(url = %url, "submission accepted");
    state.submitter.submit(url).await;

    StatusCode::ACCEPTED.into_response()
}

/// Returns up to `MAX_LISTED_URLS` stored records in store order
///
/// Every stored value is decoded first; a single corrupt record fails the
/// whole listing, wherever it sits.
pub async fn list_urls(State(state): State<AppState>) -> Response {
    let values = match state.store.get_all() {
        Ok(values) => values,
        Err(e) => {
            tracing::error!("Unable to fetch urls from the store: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unable to fetch urls from the db",
            )
                .into_response();
        }
    };

    let mut records = Vec::with_capacity(values.len());
    for value in &values {
        match UrlRecord::from_bytes(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::error!("{}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "unable to unmarshal bytes into URL",
                )
                    .into_response();
            }
        }
    }
    records.truncate(MAX_LISTED_URLS);

    Json(records).into_response()
}

fn is_fetchable(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fetchable() {
        assert!(is_fetchable("http://www.example.com"));
        assert!(is_fetchable("https://example.com/path?q=1"));

        assert!(!is_fetchable(""));
        assert!(!is_fetchable("www.example.com"));
        assert!(!is_fetchable("ftp://example.com/file"));
        assert!(!is_fetchable("mailto:someone@example.com"));
    }
}
