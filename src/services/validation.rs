//! Pure input checks used by the creation pipeline.

use crate::error::{AppError, AppResult};
use crate::models::RawDuration;
use regex::Regex;
use url::Url as UrlParser;

/// Parse `candidate` as an absolute URL with both a scheme and a host and return its
/// serialized form.
///
/// The parser drops embedded tabs and newlines and percent-encodes the rest, so the
/// returned string is always safe to send back in a `Location` header. With `strict`
/// set, only `http` and `https` are accepted.
pub fn normalize_url(candidate: &str, strict: bool) -> Option<String> {
    let parsed = UrlParser::parse(candidate.trim()).ok()?;

    if !parsed.has_host() {
        return None;
    }
    if strict && !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }

    Some(parsed.into())
}

/// Returns true iff `candidate` parses as an absolute URL with both a scheme and a host.
pub fn validate_url(candidate: &str, strict: bool) -> bool {
    normalize_url(candidate, strict).is_some()
}

/// Interpret a raw validity value as a positive number of minutes.
///
/// `Ok(None)` means the caller did not specify a value. Whole floats such as `30.0`
/// and numeric strings such as `" 30 "` are accepted.
pub fn validate_duration(raw: Option<&RawDuration>) -> AppResult<Option<u32>> {
    let minutes = match raw {
        None => return Ok(None),
        Some(RawDuration::Text(text)) if text.trim().is_empty() => return Ok(None),
        Some(RawDuration::Integer(value)) => Some(*value as f64),
        Some(RawDuration::Float(value)) => Some(*value),
        Some(RawDuration::Text(text)) => text.trim().parse::<f64>().ok(),
        Some(RawDuration::Other(_)) => None,
    };

    match minutes {
        Some(m) if m.is_finite() && m.fract() == 0.0 && m >= 1.0 && m <= u32::MAX as f64 => {
            Ok(Some(m as u32))
        }
        _ => Err(AppError::InvalidDuration(format!(
            "{:?} is not a positive whole number of minutes",
            raw
        ))),
    }
}

/// Check a caller-supplied short code: 4-16 characters of `[A-Za-z0-9_-]`,
/// starting with a letter or digit so it never shadows the `/_` routes.
pub fn validate_short_code(code: &str) -> AppResult<()> {
    let code_regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]{3,15}$")
        .map_err(|e| AppError::Internal(format!("Invalid regex pattern: {}", e)))?;

    if !code_regex.is_match(code) {
        return Err(AppError::InvalidShortCode(format!(
            "'{}' must be 4-16 alphanumeric characters, underscores, or hyphens",
            code
        )));
    }

    Ok(())
}
