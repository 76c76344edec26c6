use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum number of links accepted in a single creation request.
pub const MAX_BATCH_SIZE: usize = 5;

/// Source recorded for clicks that carry no referrer.
pub const DIRECT_SOURCE: &str = "Direct";

/// Location recorded when no lookup result is available.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A shortened link and its click history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub short_code: String,
    pub long_url: String,
    pub validity_minutes: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub clicks: Vec<ClickEvent>,
}

impl LinkRecord {
    /// Build a fresh record with an empty click history.
    pub fn new(
        short_code: impl Into<String>,
        long_url: impl Into<String>,
        validity_minutes: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            short_code: short_code.into(),
            long_url: long_url.into(),
            validity_minutes,
            created_at,
            clicks: Vec::new(),
        }
    }
}

/// A single successful resolution of a short link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub location: String,
}

/// Validity as submitted by a caller. Anything that is neither a number nor a
/// string lands in `Other` and is treated as an invalid duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

/// One entry of a creation batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLinkItem {
    #[serde(alias = "long_url")]
    pub url: String,

    #[serde(default, alias = "validity_minutes")]
    pub validity: Option<RawDuration>,

    #[serde(default, alias = "short_code")]
    pub shortcode: Option<String>,
}

/// Request to shorten a batch of URLs
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinksRequest {
    #[validate(length(min = 1, max = 5, message = "A batch must contain between 1 and 5 links"))]
    pub links: Vec<CreateLinkItem>,
}

/// Public view of a link, without its click history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
    pub validity_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
    pub click_count: usize,
}

/// Link details including the full click history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkInfoResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub clicks: Vec<ClickEvent>,
}

/// Outcome of one item in a creation batch
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreateLinkOutcome {
    Created { link: LinkResponse },
    Rejected { error: String, message: String },
}

impl CreateLinkOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateLinkOutcome::Created { .. })
    }
}

/// Response after processing a creation batch
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateLinksResponse {
    pub created: usize,
    pub rejected: usize,
    pub results: Vec<CreateLinkOutcome>,
}

/// Aggregate figures over the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_links: usize,
    pub total_clicks: usize,
    pub active_links: usize,
    pub expired_links: usize,
}

/// Paginated response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
