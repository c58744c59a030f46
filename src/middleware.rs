use crate::cors::{CorsDecision, CorsRegistry};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tower::{Layer, ServiceExt};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID wrapper for use in request extensions
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
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

/// Request ID middleware - adds a unique ID to each request
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    // Try to get existing request ID from header, or generate new one
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| RequestId(s.to_string()))
        .unwrap_or_default();

    tracing::info!(
        request_id = %request_id.as_str(),
        method = %req.method(),
        path = %req.uri().path(),
        client_ip = %extract_client_ip(req.headers()),
        "Incoming request"
    );

    let header_value = HeaderValue::from_str(request_id.as_str()).ok();
    req.extensions_mut().insert(request_id);

    let mut response = next.run(req).await;

    // Add request ID to response headers
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// CORS middleware - routes requests under a mapped path through the
/// mapping's `CorsLayer`.
///
/// Requests the rule refuses are answered with 403 and never reach the
/// handler. Unmapped paths and non-CORS requests pass through untouched.
pub async fn cors_middleware(
    State(registry): State<Arc<CorsRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    match registry.evaluate(req.method(), req.uri(), req.headers()) {
        CorsDecision::Skip => next.run(req).await,
        CorsDecision::Apply(mapping) => mapping
            .layer()
            .layer(next)
            .oneshot(req)
            .await
            .unwrap_or_else(|never: Infallible| match never {}),
        CorsDecision::Reject(reason) => {
            tracing::debug!(
                request_id = req.extensions().get::<RequestId>().map(RequestId::as_str),
                path = %req.uri().path(),
                method = %req.method(),
                origin = ?req.headers().get(header::ORIGIN),
                reason = %reason,
                "Rejected CORS request"
            );
            (StatusCode::FORBIDDEN, Body::from("Invalid CORS request")).into_response()
        }
    }
}
