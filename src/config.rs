use crate::error::{AppError, AppResult};
use axum::http::HeaderName;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub links: LinkConfig,
    pub location: LocationConfig,
    pub snapshot: SnapshotConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    pub short_code_length: usize,
    pub short_code_max_attempts: u32,
    pub default_validity_minutes: u32,
    pub strict_url_validation: bool,
}

#[derive(Debug, Clone)]
pub struct LocationConfig {
    pub header: Option<HeaderName>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    pub path: Option<PathBuf>,
    pub interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u64,
    pub burst_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Configuration(format!(
                "Invalid LOG_FORMAT '{}', expected 'text' or 'json'",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                base_url: "http://127.0.0.1:3000".to_string(),
            },
            links: LinkConfig {
                short_code_length: 5,
                short_code_max_attempts: 10,
                default_validity_minutes: 30,
                strict_url_validation: false,
            },
            location: LocationConfig {
                header: None,
                timeout_ms: 250,
            },
            snapshot: SnapshotConfig {
                path: None,
                interval_seconds: 60,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: 60,
                burst_size: 10,
            },
            cors: CorsConfig {
                allowed_origins: vec!["*".to_string()],
            },
            log_format: LogFormat::Text,
        }
    }
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        None => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = lookup("SERVER_HOST").unwrap_or(defaults.server.host);
        let port: u16 = parse_var(&lookup, "SERVER_PORT", defaults.server.port)?;
        let base_url = lookup("BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        let links = LinkConfig {
            short_code_length: parse_var(
                &lookup,
                "SHORT_CODE_LENGTH",
                defaults.links.short_code_length,
            )?,
            short_code_max_attempts: parse_var(
                &lookup,
                "SHORT_CODE_MAX_ATTEMPTS",
                defaults.links.short_code_max_attempts,
            )?,
            default_validity_minutes: parse_var(
                &lookup,
                "DEFAULT_VALIDITY_MINUTES",
                defaults.links.default_validity_minutes,
            )?,
            strict_url_validation: parse_var(
                &lookup,
                "STRICT_URL_VALIDATION",
                defaults.links.strict_url_validation,
            )?,
        };

        let header = lookup("LOCATION_HEADER")
            .map(|h| {
                HeaderName::from_str(h.trim().to_ascii_lowercase().as_str())
                    .map_err(|_| AppError::Configuration("Invalid LOCATION_HEADER".to_string()))
            })
            .transpose()?;
        let location = LocationConfig {
            header,
            timeout_ms: parse_var(
                &lookup,
                "LOCATION_LOOKUP_TIMEOUT_MS",
                defaults.location.timeout_ms,
            )?,
        };

        let snapshot = SnapshotConfig {
            path: lookup("SNAPSHOT_PATH").map(PathBuf::from),
            interval_seconds: parse_var(
                &lookup,
                "SNAPSHOT_INTERVAL_SECONDS",
                defaults.snapshot.interval_seconds,
            )?,
        };

        let rate_limit = RateLimitConfig {
            requests_per_minute: parse_var(
                &lookup,
                "RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit.requests_per_minute,
            )?,
            burst_size: parse_var(&lookup, "RATE_LIMIT_BURST", defaults.rate_limit.burst_size)?,
        };

        // CORS config
        let allowed_origins_str = lookup("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());
        let allowed_origins: Vec<String> = if allowed_origins_str.trim() == "*" {
            vec!["*".to_string()]
        } else {
            allowed_origins_str
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let log_format = parse_var(&lookup, "LOG_FORMAT", defaults.log_format)?;

        let config = Config {
            server: ServerConfig {
                host,
                port,
                base_url,
            },
            links,
            location,
            snapshot,
            rate_limit,
            cors: CorsConfig { allowed_origins },
            log_format,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        if self.links.short_code_length < 4 || self.links.short_code_length > 16 {
            return Err(AppError::Configuration(
                "SHORT_CODE_LENGTH must be between 4 and 16".to_string(),
            ));
        }

        if self.links.short_code_max_attempts < 1 || self.links.short_code_max_attempts > 100 {
            return Err(AppError::Configuration(
                "SHORT_CODE_MAX_ATTEMPTS must be between 1 and 100".to_string(),
            ));
        }

        if self.links.default_validity_minutes < 1 {
            return Err(AppError::Configuration(
                "DEFAULT_VALIDITY_MINUTES must be at least 1".to_string(),
            ));
        }

        if self.location.timeout_ms == 0 {
            return Err(AppError::Configuration(
                "LOCATION_LOOKUP_TIMEOUT_MS must be greater than 0".to_string(),
            ));
        }

        if self.snapshot.interval_seconds == 0 {
            return Err(AppError::Configuration(
                "SNAPSHOT_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.requests_per_minute == 0 {
            return Err(AppError::Configuration(
                "RATE_LIMIT_PER_MINUTE must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.burst_size == 0 {
            return Err(AppError::Configuration(
                "RATE_LIMIT_BURST must be greater than 0".to_string(),
            ));
        }

        if url::Url::parse(&self.server.base_url).is_err() {
            return Err(AppError::Configuration(
                "BASE_URL must be an absolute URL".to_string(),
            ));
        }

        Ok(())
    }
}
