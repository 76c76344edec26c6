use crate::error::AppResult;
use crate::models::{LinkInfoResponse, PaginatedResponse};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

use super::types::ListLinksQuery;
use super::AppState;

/// Get global statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.store.stats(Utc::now())))
}

/// List all links with their clicks (paginated, oldest first)
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListLinksQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(50).min(100); // Max 100
    let offset = query.offset.unwrap_or(0);
    let now = Utc::now();

    let records = state.store.list_all();
    let total = records.len();
    let items: Vec<LinkInfoResponse> = records
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|record| state.link_info_response(record, now))
        .collect();

    Ok(Json(PaginatedResponse {
        items,
        total,
        limit,
        offset,
    }))
}
