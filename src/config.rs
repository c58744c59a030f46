mod cors;
mod database;
mod server;

pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use server::ServerConfig;

use crate::error::{AppError, AppResult};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Unset variables fall back to their defaults; set but unparsable ones are
    /// reported as configuration errors.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let server = ServerConfig {
            host: lookup("SERVER_HOST").unwrap_or(defaults.server.host),
            port: parsed(&lookup, "SERVER_PORT", defaults.server.port)?,
        };

        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", defaults.database.max_connections)?,
            min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS", defaults.database.min_connections)?,
            acquire_timeout_seconds: parsed(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECONDS",
                defaults.database.acquire_timeout_seconds,
            )?,
        };

        // CORS config
        let cors = CorsConfig {
            path_pattern: lookup("CORS_PATH_PATTERN")
                .map(|p| p.trim().to_string())
                .unwrap_or(defaults.cors.path_pattern),
            allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.cors.allowed_origins),
            allowed_methods: lookup("CORS_ALLOWED_METHODS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.cors.allowed_methods),
            allowed_headers: lookup("CORS_ALLOWED_HEADERS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.cors.allowed_headers),
            exposed_headers: lookup("CORS_EXPOSED_HEADERS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.cors.exposed_headers),
            allow_credentials: parsed(
                &lookup,
                "CORS_ALLOW_CREDENTIALS",
                defaults.cors.allow_credentials,
            )?,
            max_age_seconds: parsed(&lookup, "CORS_MAX_AGE_SECONDS", defaults.cors.max_age_seconds)?,
        };

        let config = Config {
            server,
            database,
            cors,
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Configuration(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        self.database.validate().map_err(AppError::Configuration)?;

        // Validate CORS settings; rule-level checks happen at registration
        if self.cors.allowed_origins.is_empty() {
            return Err(AppError::Configuration(
                "CORS_ALLOWED_ORIGINS cannot be empty".to_string(),
            ));
        }

        if self.cors.allowed_methods.is_empty() {
            return Err(AppError::Configuration(
                "CORS_ALLOWED_METHODS cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parsed<T, F>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        None => Ok(default),
    }
}

/// Split a comma-separated variable, dropping blank entries.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
