use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{CreateLinkOutcome, CreateLinksRequest, CreateLinksResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use super::AppState;

/// Shorten a batch of URLs
pub async fn create_links(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLinksRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    payload
        .validate()
        .map_err(|e| AppError::InvalidRequest(format!("Validation failed: {}", e)))?;

    let results = state.links.create_batch(&payload.links)?;

    let now = Utc::now();
    let results: Vec<CreateLinkOutcome> = results
        .into_iter()
        .map(|result| match result {
            Ok(record) => CreateLinkOutcome::Created {
                link: state.link_response(&record, now),
            },
            Err(e) => CreateLinkOutcome::Rejected {
                error: e.code().to_string(),
                message: e.public_message(),
            },
        })
        .collect();

    let created = results.iter().filter(|r| r.is_created()).count();
    let response = CreateLinksResponse {
        created,
        rejected: results.len() - created,
        results,
    };

    let status = if response.rejected == 0 {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((status, Json(response)))
}

/// Resolve a short link, record the click and redirect
pub async fn resolve_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Redirect> {
    let long_url = state.resolver.resolve(&code, &ctx).await?;

    // Temporary, so browsers come back through the resolver on every visit
    Ok(Redirect::temporary(&long_url))
}

/// Get a short link with its click history
pub async fn get_link_info(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .store
        .lookup(&code)
        .ok_or(AppError::NotFound(code))?;

    Ok(Json(state.link_info_response(record, Utc::now())))
}
