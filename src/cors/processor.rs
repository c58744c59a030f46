//! Per-request CORS decisions.
//!
//! The response headers come from each mapping's `CorsLayer`. This module
//! only decides whether a request is cross-origin, and whether the rule
//! refuses it before it reaches a handler.

use super::registry::CorsMapping;
use super::rule::CorsRule;
use http::header::{self, HeaderMap};
use http::{Method, Uri};
use thiserror::Error;
use url::Url;

/// Why a cross-origin request was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("origin {0} is not allowed")]
    OriginNotAllowed(String),

    #[error("method {0} is not allowed")]
    MethodNotAllowed(String),

    #[error("malformed CORS request header: {0}")]
    Malformed(&'static str),
}

/// Outcome of evaluating a request.
#[derive(Debug, Clone)]
pub enum CorsDecision<'a> {
    /// No mapping covers the path, or the request is not cross-origin.
    Skip,
    /// The mapping's layer answers the preflight or decorates the response.
    Apply(&'a CorsMapping),
    /// Refused; the handler is not invoked.
    Reject(RejectReason),
}

/// Whether the request is a CORS preflight.
pub fn is_preflight(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Classify a request already known to fall under `mapping`.
pub fn classify<'a>(
    mapping: &'a CorsMapping,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> CorsDecision<'a> {
    let origin = match headers.get(header::ORIGIN) {
        Some(value) => value,
        None => return CorsDecision::Skip,
    };
    let origin = match origin.to_str() {
        Ok(origin) => origin,
        Err(_) => return CorsDecision::Reject(RejectReason::Malformed("Origin")),
    };

    if is_same_origin(origin, uri, headers) {
        return CorsDecision::Skip;
    }

    match check_request(mapping.rule(), origin, method, headers) {
        Ok(()) => CorsDecision::Apply(mapping),
        Err(reason) => CorsDecision::Reject(reason),
    }
}

/// Origin and method checks for a cross-origin request.
///
/// Requested headers are not checked here; the browser enforces them from
/// `Access-Control-Allow-Headers`.
pub fn check_request(
    rule: &CorsRule,
    origin: &str,
    method: &Method,
    headers: &HeaderMap,
) -> Result<(), RejectReason> {
    if !rule.check_origin(origin) {
        return Err(RejectReason::OriginNotAllowed(origin.to_string()));
    }

    let requested = if is_preflight(method, headers) {
        headers
            .get(header::ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|v| Method::from_bytes(v.as_bytes()).ok())
            .ok_or(RejectReason::Malformed("Access-Control-Request-Method"))?
    } else {
        method.clone()
    };

    if !rule.check_method(&requested) {
        return Err(RejectReason::MethodNotAllowed(requested.to_string()));
    }

    Ok(())
}

/// Whether `origin` is the origin the request was sent to.
///
/// The listener speaks plain HTTP, so the scheme is `http` unless the
/// request target is in absolute form.
fn is_same_origin(origin: &str, uri: &Uri, headers: &HeaderMap) -> bool {
    let host = match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => host,
        None => return false,
    };
    let scheme = uri.scheme_str().unwrap_or("http");

    let origin = match Url::parse(origin) {
        Ok(url) => url,
        Err(_) => return false,
    };
    let request = match Url::parse(&format!("{}://{}", scheme, host)) {
        Ok(url) => url,
        Err(_) => return false,
    };

    origin.scheme() == request.scheme()
        && origin.host_str() == request.host_str()
        && origin.port_or_known_default() == request.port_or_known_default()
}
