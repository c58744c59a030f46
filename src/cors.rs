//! Path-scoped CORS policy.
//!
//! Rules are registered once at start-up into a [`CorsRegistry`], which is
//! then shared immutably with the request pipeline (see
//! [`crate::middleware::cors_middleware`]). Each rule is paired with a
//! `tower_http::cors::CorsLayer` that emits its headers.

mod layer;
mod pattern;
mod processor;
mod registry;
mod rule;

pub use layer::build_cors_layer;
pub use pattern::PathPattern;
pub use processor::{check_request, classify, is_preflight, CorsDecision, RejectReason};
pub use registry::{CorsMapping, CorsRegistry};
pub use rule::{AllowList, CorsRule, CorsRuleSummary, DEFAULT_MAX_AGE};

use crate::config::CorsConfig;
use http::{HeaderName, Method};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors raised while building CORS rules.
#[derive(Debug, Error)]
pub enum CorsConfigError {
    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("invalid header name '{0}'")]
    InvalidHeader(String),

    #[error("allowed origins cannot contain '*' when credentials are allowed")]
    WildcardOriginWithCredentials,

    #[error("at least one allowed origin is required")]
    EmptyOrigins,

    #[error("at least one allowed method is required")]
    EmptyMethods,
}

/// Register the CORS mappings described by `config`.
///
/// Called once during start-up; the returned registry is never mutated afterwards.
pub fn register_cors_mappings(config: &CorsConfig) -> Result<CorsRegistry, CorsConfigError> {
    let rule = CorsRule::new(&config.path_pattern)?
        .allowed_origins(&config.allowed_origins)
        .allowed_methods(parse_methods(&config.allowed_methods)?)
        .allowed_headers(parse_allowed_headers(&config.allowed_headers)?)
        .exposed_headers(parse_header_names(&config.exposed_headers)?)
        .allow_credentials(config.allow_credentials)
        .max_age(match config.max_age_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        });

    if rule.credentials() && rule.headers().is_any() {
        info!(
            pattern = %rule.pattern(),
            "Wildcard allowed headers with credentials: preflight responses mirror the requested headers"
        );
    }

    let summary = rule.summary();
    let mut registry = CorsRegistry::new();
    registry.add_mapping(rule)?;

    info!(
        pattern = %summary.path_pattern,
        origins = ?summary.allowed_origins,
        methods = ?summary.allowed_methods,
        credentials = summary.allow_credentials,
        "Registered CORS mapping"
    );

    Ok(registry)
}

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == "*")
}

fn parse_methods(values: &[String]) -> Result<AllowList<Method>, CorsConfigError> {
    if is_wildcard(values) {
        return Ok(AllowList::Any);
    }

    values
        .iter()
        .map(|v| {
            Method::from_bytes(v.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| CorsConfigError::InvalidMethod(v.clone()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AllowList::Only)
}

fn parse_allowed_headers(values: &[String]) -> Result<AllowList<HeaderName>, CorsConfigError> {
    if is_wildcard(values) {
        return Ok(AllowList::Any);
    }
    parse_header_names(values).map(AllowList::Only)
}

fn parse_header_names(values: &[String]) -> Result<Vec<HeaderName>, CorsConfigError> {
    values
        .iter()
        .map(|v| {
            HeaderName::from_bytes(v.trim().as_bytes())
                .map_err(|_| CorsConfigError::InvalidHeader(v.clone()))
        })
        .collect()
}
