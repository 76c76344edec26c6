//! Redirect resolution: lookup, expiry enforcement and click recording.

use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{ClickEvent, DIRECT_SOURCE, UNKNOWN_LOCATION};
use crate::services::expiry;
use crate::services::location::LocationLookup;
use crate::store::LinkStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url as UrlParser;

/// Resolves short codes to their target URLs and records each successful access.
#[derive(Clone)]
pub struct RedirectResolver {
    store: Arc<LinkStore>,
    location: Arc<dyn LocationLookup>,
    location_timeout: Duration,
}

impl RedirectResolver {
    pub fn new(
        store: Arc<LinkStore>,
        location: Arc<dyn LocationLookup>,
        location_timeout: Duration,
    ) -> Self {
        Self {
            store,
            location,
            location_timeout,
        }
    }

    /// Resolve `code` against the current time.
    pub async fn resolve(&self, code: &str, ctx: &RequestContext) -> AppResult<String> {
        self.resolve_at(code, ctx, Utc::now()).await
    }

    /// Resolve `code` as of `now`.
    ///
    /// Returns the long URL after the click has been appended. Unknown codes yield
    /// `AppError::NotFound` and expired links `AppError::Expired`; neither records a click.
    pub async fn resolve_at(
        &self,
        code: &str,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let (long_url, expired) = self
            .store
            .inspect(code, |record| {
                (record.long_url.clone(), expiry::is_expired(record, now))
            })
            .ok_or_else(|| {
                debug!(short_code = %code, request_id = %ctx.request_id, "Short code not found");
                AppError::NotFound(code.to_string())
            })?;

        if expired {
            info!(short_code = %code, request_id = %ctx.request_id, "Expired link accessed");
            return Err(AppError::Expired(code.to_string()));
        }

        let event = ClickEvent {
            timestamp: now,
            source: click_source(ctx.referrer.as_deref()),
            location: self.lookup_location(ctx).await,
        };
        self.store.append_click(code, event)?;

        debug!(short_code = %code, request_id = %ctx.request_id, "Click recorded");
        Ok(long_url)
    }

    async fn lookup_location(&self, ctx: &RequestContext) -> String {
        match tokio::time::timeout(self.location_timeout, self.location.resolve_location(ctx)).await
        {
            Ok(Some(location)) => location,
            Ok(None) => UNKNOWN_LOCATION.to_string(),
            Err(_) => {
                warn!(
                    provider = self.location.name(),
                    request_id = %ctx.request_id,
                    "Location lookup timed out after {:?}",
                    self.location_timeout
                );
                UNKNOWN_LOCATION.to_string()
            }
        }
    }
}

/// Reduce a referrer to its origin; keep unparseable values as-is and fall back to "Direct".
pub fn click_source(referrer: Option<&str>) -> String {
    let Some(referrer) = referrer.map(str::trim).filter(|r| !r.is_empty()) else {
        return DIRECT_SOURCE.to_string();
    };

    match UrlParser::parse(referrer) {
        Ok(parsed) if parsed.has_host() => parsed.origin().ascii_serialization(),
        _ => referrer.to_string(),
    }
}
