use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Content Security Policy: same-origin only, plus WebSocket updates and remote avatars
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     connect-src 'self' ws: wss:; \
     img-src 'self' data: https:; \
     frame-ancestors 'none'";

/// Headers added to every response
const SECURITY_HEADERS: [(HeaderName, &str); 7] = [
    (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
    // Prevent clickjacking
    (header::X_FRAME_OPTIONS, "DENY"),
    // Prevent MIME type sniffing
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (
        header::STRICT_TRANSPORT_SECURITY,
        "max-age=31536000; includeSubDomains",
    ),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (
        HeaderName::from_static("permissions-policy"),
        "geolocation=(), microphone=(), camera=(), payment=()",
    ),
];

/// Middleware to add security headers to all responses
///
/// # Security Headers
///
/// - **Content-Security-Policy**: Restrict resource loading to prevent XSS
/// - **X-Frame-Options**: Prevent clickjacking
/// - **X-Content-Type-Options**: Prevent MIME type sniffing
/// - **X-XSS-Protection**: Enable browser XSS protection
/// - **Strict-Transport-Security**: Force HTTPS
/// - **Referrer-Policy**: Limit referrer information
/// - **Permissions-Policy**: Disable unnecessary browser features
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn test_handler() -> impl IntoResponse {
        (StatusCode::OK, "test")
    }

    #[tokio::test]
    async fn test_security_headers_added() {
        let app = Router::new()
            .route("/test", get(test_handler))
            .layer(middleware::from_fn(security_headers_middleware));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let headers = response.headers();

        let expected = [
            ("x-frame-options", "DENY"),
            ("x-content-type-options", "nosniff"),
            ("x-xss-protection", "1; mode=block"),
            ("referrer-policy", "strict-origin-when-cross-origin"),
        ];
        for (name, value) in expected {
            assert_eq!(headers.get(name).unwrap(), value, "header {}", name);
        }

        let hsts = headers.get(header::STRICT_TRANSPORT_SECURITY).unwrap();
        assert!(hsts.to_str().unwrap().contains("max-age=31536000"));

        let perms = headers.get("permissions-policy").unwrap();
        assert!(perms.to_str().unwrap().contains("geolocation=()"));
    }

    #[tokio::test]
    async fn test_csp_allows_sockets_and_avatars() {
        let app = Router::new()
            .route("/test", get(test_handler))
            .layer(middleware::from_fn(security_headers_middleware));

        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        let csp = response
            .headers()
            .get(header::CONTENT_SECURITY_POLICY)
            .unwrap()
            .to_str()
            .unwrap();

        assert!(csp.contains("connect-src 'self' ws: wss:")); // Live updates
        assert!(csp.contains("img-src 'self' data: https:")); // Owner avatars
        assert!(csp.contains("frame-ancestors 'none'"));
    }
}
