//! Utility functions for general-purpose use across the application.

/// Build the external short URL for a code.
///
/// # Examples
///
/// ```
/// use snaplink::util::short_url;
///
/// assert_eq!(short_url("http://localhost:3000/", "abc12"), "http://localhost:3000/abc12");
/// ```
pub fn short_url(base_url: &str, short_code: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), short_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url() {
        assert_eq!(short_url("https://sn.ap", "abc12"), "https://sn.ap/abc12");
        assert_eq!(short_url("https://sn.ap//", "x1y2z"), "https://sn.ap/x1y2z");
    }
}
