//! Pluggable coarse location lookup for click analytics.

use crate::middleware::RequestContext;
use async_trait::async_trait;
use axum::http::HeaderName;
use std::sync::Arc;
use tracing::info;

/// Resolves a coarse origin label (country, region) for an incoming request.
///
/// Implementations must not block; the resolver bounds every call with a timeout
/// and records "Unknown" when none is available.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn resolve_location(&self, ctx: &RequestContext) -> Option<String>;

    /// Provider name, for logs
    fn name(&self) -> &'static str;
}

/// Lookup that never knows the location
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownLocation;

#[async_trait]
impl LocationLookup for UnknownLocation {
    async fn resolve_location(&self, _ctx: &RequestContext) -> Option<String> {
        None
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Reads the location from a header set by an upstream proxy or CDN, e.g. `cf-ipcountry`.
#[derive(Debug, Clone)]
pub struct HeaderLocation {
    header: HeaderName,
}

impl HeaderLocation {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

#[async_trait]
impl LocationLookup for HeaderLocation {
    async fn resolve_location(&self, ctx: &RequestContext) -> Option<String> {
        ctx.headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "XX")
            .map(str::to_string)
    }

    fn name(&self) -> &'static str {
        "header"
    }
}

/// Pick a lookup implementation from configuration.
pub fn from_config(location_header: Option<&HeaderName>) -> Arc<dyn LocationLookup> {
    let lookup: Arc<dyn LocationLookup> = match location_header {
        Some(header) => Arc::new(HeaderLocation::new(header.clone())),
        None => Arc::new(UnknownLocation),
    };
    info!("Location lookup: using {} provider", lookup.name());
    lookup
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    fn ctx_with(headers: HeaderMap) -> RequestContext {
        RequestContext::new("req-1".into(), "127.0.0.1".into(), None, None).with_headers(headers)
    }

    #[tokio::test]
    async fn test_unknown_location() {
        let ctx = ctx_with(HeaderMap::new());
        assert_eq!(UnknownLocation.resolve_location(&ctx).await, None);
    }

    #[tokio::test]
    async fn test_header_location() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ipcountry", "DE".parse().unwrap());
        let lookup = HeaderLocation::new(HeaderName::from_static("cf-ipcountry"));

        assert_eq!(
            lookup.resolve_location(&ctx_with(headers)).await.as_deref(),
            Some("DE")
        );
        assert_eq!(lookup.resolve_location(&ctx_with(HeaderMap::new())).await, None);
    }

    #[tokio::test]
    async fn test_header_location_ignores_placeholder() {
        let mut headers = HeaderMap::new();
        headers.insert("cf-ipcountry", "XX".parse().unwrap());
        let lookup = HeaderLocation::new(HeaderName::from_static("cf-ipcountry"));
        assert_eq!(lookup.resolve_location(&ctx_with(headers)).await, None);
    }

    #[test]
    fn test_from_config() {
        assert_eq!(from_config(None).name(), "none");
        let header = HeaderName::from_static("x-geo-country");
        assert_eq!(from_config(Some(&header)).name(), "header");
    }
}
