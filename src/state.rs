use crate::store::SharedStore;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction.
#[derive(Clone)]
pub struct AppState {
    /// Account storage (PostgreSQL or in-memory)
    pub store: SharedStore,
}
