//! Public stats endpoint.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::stats::CacheStatus;
use crate::state::AppState;

/// GET /api/v1/stats/public
///
/// Never fails: the aggregator degrades to stale or fallback data instead.
/// `X-Cache` and `Cache-Control` reflect how the snapshot was obtained.
pub async fn handle_public_stats(State(state): State<AppState>) -> impl IntoResponse {
    let (snapshot, status) = state
        .stats
        .snapshot(state.store.as_ref(), Utc::now())
        .await;

    let cache_control = match status {
        CacheStatus::Hit | CacheStatus::Miss => "public, max-age=300",
        // Degraded data should be retried sooner.
        CacheStatus::Stale | CacheStatus::Fallback => "public, max-age=60",
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    headers.insert("x-cache", HeaderValue::from_static(status.as_str()));

    (headers, Json(json!({ "success": true, "stats": snapshot })))
}
