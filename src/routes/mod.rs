pub mod comptes_handlers;
pub mod extractors;
pub mod health;
mod router;
pub mod types;

pub use router::create_router;

// Re-export AppState for convenience
pub use crate::state::AppState;
