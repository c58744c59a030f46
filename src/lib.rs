//! banque - bank account API guarded by a path-scoped CORS policy.

pub mod admin;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod memory;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;
