use crate::config::RateLimitConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::{request_context_middleware, request_id_middleware, ClientIpKeyExtractor};
use axum::middleware;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::admin_handlers;
use super::health;
use super::link_handlers;
use super::AppState;

/// Largest accepted request body; a full batch is well under this.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    allowed_origins: Vec<String>,
    rate_limit_config: RateLimitConfig,
) -> AppResult<axum::Router> {
    let period_ms = (60_000 / rate_limit_config.requests_per_minute).max(1);

    // Strict limits for creation and the admin views
    let governor_layer_strict = GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_millisecond(period_ms)
            .burst_size(rate_limit_config.burst_size)
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .ok_or_else(|| {
                AppError::Configuration("Failed to build strict rate limiter".to_string())
            })?,
    );

    // Redirects are the hot path
    let governor_layer_lenient = GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_millisecond((period_ms / 2).max(1))
            .burst_size(rate_limit_config.burst_size.saturating_mul(2))
            .key_extractor(ClientIpKeyExtractor)
            .finish()
            .ok_or_else(|| {
                AppError::Configuration("Failed to build lenient rate limiter".to_string())
            })?,
    );

    let cors = if allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|s| s.parse::<http::HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // POST /, /_stats, /_list
    let sensitive_routes = axum::Router::new()
        .route("/", post(link_handlers::create_links))
        .route("/_stats", get(admin_handlers::get_stats))
        .route("/_list", get(admin_handlers::list_links))
        .layer(governor_layer_strict);

    // GET /{code}, GET /{code}/info
    let public_routes = axum::Router::new()
        .route("/{code}", get(link_handlers::resolve_link))
        .route("/{code}/info", get(link_handlers::get_link_info))
        .layer(governor_layer_lenient);

    // Health check endpoint (no rate limiting)
    let health_routes = axum::Router::new().route("/_health", get(health::health_check));

    // The request id layer is outermost so the context middleware can read the id.
    Ok(sensitive_routes
        .merge(public_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_context_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state))
}
