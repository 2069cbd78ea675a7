//! Cantor API crate - axum HTTP server and route handlers.
//!
//! Exposes song ingestion, "who said this line" lookups, same-voice
//! suggestions, and a health check over JSON.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
