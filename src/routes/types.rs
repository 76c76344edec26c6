use serde::{Deserialize, Serialize};

/// Query parameters for listing links
#[derive(Debug, Deserialize)]
pub struct ListLinksQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub links: usize,
    pub uptime_seconds: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
