use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_governor::key_extractor::KeyExtractor;
use uuid::Uuid;

/// Request ID wrapper for use in request extensions; defaults to a fresh UUID v4
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Ambient metadata of an incoming request, as seen by the redirect resolver
/// and the location lookup
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub client_ip: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(
        request_id: String,
        client_ip: String,
        user_agent: Option<String>,
        referrer: Option<String>,
    ) -> Self {
        Self {
            request_id,
            client_ip,
            user_agent,
            referrer,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Extract client IP address from headers
pub fn extract_client_ip(headers: &HeaderMap) -> String {
    // Check for X-Forwarded-For header (proxy/load balancer)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                return first_ip.trim().to_string();
            }
        }
    }

    // Check for X-Real-IP header
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            return real_ip_str.to_string();
        }
    }

    "unknown".to_string()
}

/// Extract user agent from headers
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract the Referer header, ignoring blank values
pub fn extract_referrer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::REFERER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    // Try to get existing request ID from header, or generate new one
    let RequestId(request_id) = req
        .headers()
        .get("x-request-id")
        .and_then(|h| h.to_str().ok())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_default();

    req.extensions_mut().insert(RequestId(request_id.clone()));

    tracing::info!(
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
        "Incoming request"
    );

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", header_value);
    }

    response
}

/// Request context middleware - must run inside `request_id_middleware`
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let headers = req.headers();
    let RequestId(request_id) = req.extensions().get::<RequestId>().cloned().unwrap_or_default();

    let context = RequestContext::new(
        request_id,
        extract_client_ip(headers),
        extract_user_agent(headers),
        extract_referrer(headers),
    )
    .with_headers(headers.clone());
    req.extensions_mut().insert(context);

    next.run(req).await
}

/// Rate limit key: the client IP as reported by the proxy headers
#[derive(Clone)]
pub struct ClientIpKeyExtractor;

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, tower_governor::GovernorError> {
        Ok(format!("ip:{}", extract_client_ip(req.headers())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_default() {
        let RequestId(id) = RequestId::default();
        assert_eq!(id.len(), 36); // UUID v4 length
        assert_ne!(id, RequestId::default().0);
    }

    #[test]
    fn test_request_context_new() {
        let ctx = RequestContext::new(
            "test-123".to_string(),
            "127.0.0.1".to_string(),
            Some("Mozilla/5.0".to_string()),
            Some("https://news.example.com/item".to_string()),
        );

        assert_eq!(ctx.request_id, "test-123");
        assert_eq!(ctx.client_ip, "127.0.0.1");
        assert_eq!(ctx.user_agent, Some("Mozilla/5.0".to_string()));
        assert!(ctx.headers.is_empty());
    }

    #[test]
    fn test_extract_client_ip_from_x_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "192.168.1.1".parse().unwrap());

        assert_eq!(extract_client_ip(&headers), "192.168.1.1");
    }

    #[test]
    fn test_extract_client_ip_from_multiple_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "192.168.1.1, 10.0.0.1".parse().unwrap());

        assert_eq!(extract_client_ip(&headers), "192.168.1.1");
    }

    #[test]
    fn test_extract_client_ip_unknown() {
        assert_eq!(extract_client_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_extract_referrer() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_referrer(&headers), None);

        headers.insert(header::REFERER, "   ".parse().unwrap());
        assert_eq!(extract_referrer(&headers), None);

        headers.insert(header::REFERER, "https://blog.example.org/post".parse().unwrap());
        assert_eq!(
            extract_referrer(&headers).as_deref(),
            Some("https://blog.example.org/post")
        );
    }
}
