//! Administrative command handlers.
//!
//! This module contains CLI command handlers for administrative tasks such
//! as running migrations and inspecting the registered CORS policy.

use crate::config::Config;
use crate::cors::{register_cors_mappings, CorsDecision, CorsRegistry};
use crate::db::PgRepository;
use crate::error::{AppError, AppResult};
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, Response};
use clap::Subcommand;
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use tower::{service_fn, Layer, ServiceExt};
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Run database migrations
    Migrate,

    /// Print the registered CORS rules as JSON
    CorsPolicy,

    /// Show how the CORS policy answers a simulated request
    CheckCors {
        /// Request path (e.g. /banque/comptes)
        #[arg(long)]
        path: String,

        /// Value of the Origin header
        #[arg(long)]
        origin: Option<String>,

        /// Request method, or the requested method for a preflight
        #[arg(long, default_value = "GET")]
        method: String,

        /// Simulate a preflight (OPTIONS with Access-Control-Request-Method)
        #[arg(long)]
        preflight: bool,

        /// Comma-separated Access-Control-Request-Headers for a preflight
        #[arg(long)]
        request_headers: Option<String>,
    },
}

/// Run an administrative command with the given configuration.
pub async fn run(config: Config, admin_command: AdminCommands) -> AppResult<()> {
    match admin_command {
        AdminCommands::Migrate => migrate(config).await,
        AdminCommands::CorsPolicy => cors_policy(config),
        AdminCommands::CheckCors {
            path,
            origin,
            method,
            preflight,
            request_headers,
        } => {
            let registry = register_cors_mappings(&config.cors)?;
            let request = SimulatedRequest {
                path,
                origin,
                method,
                preflight,
                request_headers,
            };
            let report = check_cors(&registry, &request).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

/// Run database migrations.
async fn migrate(config: Config) -> AppResult<()> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| AppError::MissingEnvVar("DATABASE_URL".to_string()))?;

    info!("Running database migrations...");

    let repository = PgRepository::new(
        url,
        config.database.max_connections,
        config.database.min_connections,
        config.database.acquire_timeout_seconds,
    )
    .await?;

    repository.run_migrations().await?;

    info!("Migrations completed successfully");
    Ok(())
}

/// Print the registered CORS rules.
fn cors_policy(config: Config) -> AppResult<()> {
    let registry = register_cors_mappings(&config.cors)?;
    println!("{}", serde_json::to_string_pretty(&registry.summaries())?);
    Ok(())
}

/// Request described on the command line.
#[derive(Debug, Clone)]
pub struct SimulatedRequest {
    pub path: String,
    pub origin: Option<String>,
    pub method: String,
    pub preflight: bool,
    pub request_headers: Option<String>,
}

/// Outcome of a simulated request.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub decision: &'static str,
    pub status: Option<u16>,
    pub reason: Option<String>,
    pub headers: BTreeMap<String, String>,
}

/// Run a simulated request through the registry and the matching `CorsLayer`.
pub async fn check_cors(registry: &CorsRegistry, request: &SimulatedRequest) -> AppResult<CheckReport> {
    let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| AppError::Validation(format!("Invalid method: {}", request.method)))?;

    let mut builder = Request::builder().uri(request.path.as_str());
    if let Some(origin) = &request.origin {
        builder = builder.header(header::ORIGIN, header_value(origin)?);
    }

    builder = if request.preflight {
        builder = builder.header(
            header::ACCESS_CONTROL_REQUEST_METHOD,
            header_value(method.as_str())?,
        );
        if let Some(requested) = &request.request_headers {
            builder = builder.header(header::ACCESS_CONTROL_REQUEST_HEADERS, header_value(requested)?);
        }
        builder.method(Method::OPTIONS)
    } else {
        builder.method(method)
    };

    let simulated = builder
        .body(Body::empty())
        .map_err(|e| AppError::Validation(format!("Invalid request: {}", e)))?;

    let decision = registry.evaluate(simulated.method(), simulated.uri(), simulated.headers());

    let report = match decision {
        CorsDecision::Skip => CheckReport {
            decision: "skip",
            status: None,
            reason: None,
            headers: BTreeMap::new(),
        },
        CorsDecision::Reject(reason) => CheckReport {
            decision: "reject",
            status: Some(403),
            reason: Some(reason.to_string()),
            headers: BTreeMap::new(),
        },
        CorsDecision::Apply(mapping) => {
            let preflight = simulated.method() == Method::OPTIONS;
            let handler = service_fn(|_req: Request<Body>| async {
                Ok::<_, Infallible>(Response::new(Body::empty()))
            });
            let response = mapping
                .layer()
                .layer(handler)
                .oneshot(simulated)
                .await
                .unwrap_or_else(|never| match never {});

            CheckReport {
                decision: if preflight { "preflight" } else { "continue" },
                status: preflight.then(|| response.status().as_u16()),
                reason: None,
                headers: cors_headers(&response),
            }
        }
    };

    Ok(report)
}

/// CORS-related response headers, keyed by lowercase name.
fn cors_headers(response: &Response<Body>) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter(|(name, _)| {
            name.as_str().starts_with("access-control-") || *name == header::VARY
        })
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect()
}

fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| AppError::Validation(format!("Invalid header value: {}", value)))
}
