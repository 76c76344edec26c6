use crate::config::Config;
use crate::jobs::JobSender;
use crate::models::{LinkInfoResponse, LinkRecord, LinkResponse};
use crate::services::{
    expiry, location, LinkService, LinkSettings, LocationLookup, RedirectResolver,
    ShortCodeAllocator,
};
use crate::store::LinkStore;
use crate::util::short_url;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all HTTP handlers.
///
/// Wrapped in `Arc` and handed to every request handler via Axum's State
/// extraction.
#[derive(Clone)]
pub struct AppState {
    /// The link store backing both services
    pub store: Arc<LinkStore>,

    /// Creation pipeline
    pub links: LinkService,

    /// Redirect resolution and click recording
    pub resolver: RedirectResolver,

    /// Snapshot flush jobs, when persistence is configured
    pub job_sender: Option<JobSender>,

    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Process start, reported by the health check
    pub started_at: Instant,
}

impl AppState {
    /// Wire the services around `store` using `config`.
    pub fn new(config: &Config, store: Arc<LinkStore>, job_sender: Option<JobSender>) -> Self {
        let lookup = location::from_config(config.location.header.as_ref());
        Self::with_location(config, store, job_sender, lookup)
    }

    /// Like [`AppState::new`] with an explicit location lookup.
    pub fn with_location(
        config: &Config,
        store: Arc<LinkStore>,
        job_sender: Option<JobSender>,
        lookup: Arc<dyn LocationLookup>,
    ) -> Self {
        let allocator = ShortCodeAllocator::new(
            config.links.short_code_length,
            config.links.short_code_max_attempts,
        );
        let links = LinkService::new(
            Arc::clone(&store),
            allocator,
            LinkSettings {
                default_validity_minutes: config.links.default_validity_minutes,
                strict_url_validation: config.links.strict_url_validation,
            },
        );
        let resolver = RedirectResolver::new(
            Arc::clone(&store),
            lookup,
            Duration::from_millis(config.location.timeout_ms),
        );

        Self {
            store,
            links,
            resolver,
            job_sender,
            base_url: config.server.base_url.clone(),
            started_at: Instant::now(),
        }
    }

    /// Render a record for API responses
    pub fn link_response(&self, record: &LinkRecord, now: DateTime<Utc>) -> LinkResponse {
        LinkResponse {
            short_code: record.short_code.clone(),
            short_url: short_url(&self.base_url, &record.short_code),
            long_url: record.long_url.clone(),
            validity_minutes: record.validity_minutes,
            created_at: record.created_at,
            expires_at: expiry::expires_at(record),
            expired: expiry::is_expired(record, now),
            click_count: record.clicks.len(),
        }
    }

    pub fn link_info_response(&self, record: LinkRecord, now: DateTime<Utc>) -> LinkInfoResponse {
        LinkInfoResponse {
            link: self.link_response(&record, now),
            clicks: record.clicks,
        }
    }
}
