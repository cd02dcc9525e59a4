//! Search API handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use torrsearch_core::MergedRecord;
use tracing::info;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Query string of `GET /search/torrent`: one `query` and any number of `ft`.
#[derive(Debug, Default, PartialEq)]
pub struct TorrentQuery {
    pub query: String,
    pub filters: Vec<String>,
}

impl TorrentQuery {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut parsed = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "query" => parsed.query = value,
                "ft" => parsed.filters.push(value),
                _ => {}
            }
        }
        parsed
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<MergedRecord>,
    pub raw_count: usize,
    pub merged_count: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub backend_errors: HashMap<String, String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/search/torrent?query=...&ft=...&ft=...
///
/// Returns the ranked list of merged records. Backend failures only shrink
/// the list; a missing query yields `[]`.
pub async fn search_torrent(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<Vec<MergedRecord>> {
    let params = TorrentQuery::from_pairs(pairs);
    let results = state
        .coordinator()
        .search_and_merge(&params.query, params.filters.as_slice())
        .await;

    info!(
        query = %params.query,
        filters = params.filters.len(),
        results = results.len(),
        "Torrent search served"
    );

    Json(results)
}

/// POST /api/v1/search
///
/// Same pipeline as `search_torrent`, answered with the full search report.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let report = state
        .coordinator()
        .search(&body.query, body.filters.as_slice())
        .await;

    Json(SearchResponse {
        query: body.query,
        results: report.results,
        raw_count: report.raw_count,
        merged_count: report.merged_count,
        duration_ms: report.duration_ms,
        backend_errors: report.backend_errors,
    })
}
