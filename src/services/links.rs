//! Creation pipeline: validate, allocate a short code, store.

use crate::error::{AppError, AppResult};
use crate::models::{CreateLinkItem, LinkRecord, MAX_BATCH_SIZE};
use crate::services::short_code::ShortCodeAllocator;
use crate::services::validation::{normalize_url, validate_duration};
use crate::store::LinkStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Creation settings taken from configuration
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub default_validity_minutes: u32,
    pub strict_url_validation: bool,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            default_validity_minutes: 30,
            strict_url_validation: false,
        }
    }
}

/// Turns creation requests into stored links.
#[derive(Clone)]
pub struct LinkService {
    store: Arc<LinkStore>,
    allocator: ShortCodeAllocator,
    settings: LinkSettings,
}

impl LinkService {
    pub fn new(store: Arc<LinkStore>, allocator: ShortCodeAllocator, settings: LinkSettings) -> Self {
        Self {
            store,
            allocator,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<LinkStore> {
        &self.store
    }

    /// Create a batch of links stamped with the current time.
    pub fn create_batch(&self, items: &[CreateLinkItem]) -> AppResult<Vec<AppResult<LinkRecord>>> {
        self.create_batch_at(items, Utc::now())
    }

    /// Create a batch of links stamped with `now`.
    ///
    /// Every URL is checked before anything is stored: one malformed URL rejects the
    /// whole batch with `AppError::InvalidUrl`. After that, each item succeeds or fails
    /// on its own (duplicate or malformed short code, exhausted allocation), and the
    /// per-item results are returned in request order.
    pub fn create_batch_at(
        &self,
        items: &[CreateLinkItem],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<AppResult<LinkRecord>>> {
        if items.is_empty() || items.len() > MAX_BATCH_SIZE {
            return Err(AppError::InvalidRequest(format!(
                "A batch must contain between 1 and {} links",
                MAX_BATCH_SIZE
            )));
        }

        let mut long_urls = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match normalize_url(&item.url, self.settings.strict_url_validation) {
                Some(long_url) => long_urls.push(long_url),
                None => {
                    warn!(index, url = %item.url, "Invalid URL entered, batch rejected");
                    return Err(AppError::InvalidUrl(format!(
                        "item {}: '{}' is not an absolute URL",
                        index + 1,
                        item.url
                    )));
                }
            }
        }

        let results: Vec<AppResult<LinkRecord>> = items
            .iter()
            .zip(&long_urls)
            .map(|(item, long_url)| self.create_one(item, long_url, now))
            .collect();

        let created = results.iter().filter(|r| r.is_ok()).count();
        info!(
            count = created,
            rejected = results.len() - created,
            "URLs shortened"
        );

        Ok(results)
    }

    fn create_one(
        &self,
        item: &CreateLinkItem,
        long_url: &str,
        now: DateTime<Utc>,
    ) -> AppResult<LinkRecord> {
        let validity_minutes = match validate_duration(item.validity.as_ref()) {
            Ok(Some(minutes)) => minutes,
            Ok(None) => self.settings.default_validity_minutes,
            Err(e) => {
                warn!(
                    "{}; using default of {} minutes",
                    e, self.settings.default_validity_minutes
                );
                self.settings.default_validity_minutes
            }
        };

        // Each claim is the store's atomic insert, so a generated code that loses a
        // race is redrawn within the same attempt budget.
        let code = self
            .allocator
            .allocate(item.shortcode.as_deref(), |code| {
                let record = LinkRecord::new(code, long_url, validity_minutes, now);
                match self.store.create(record) {
                    Ok(()) => Ok(true),
                    Err(AppError::DuplicateCode(_)) => {
                        debug!(short_code = %code, "Short code taken, trying another");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            })
            .inspect_err(log_rejection)?;

        debug!(short_code = %code, "Short link created");
        Ok(LinkRecord::new(code, long_url, validity_minutes, now))
    }
}

fn log_rejection(err: &AppError) {
    match err {
        AppError::DuplicateCode(code) => info!(short_code = %code, "Duplicate short code rejected"),
        other => warn!("Link creation rejected: {}", other),
    }
}
