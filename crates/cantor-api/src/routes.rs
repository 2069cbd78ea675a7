//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cantor_core::config::CantorConfig;
use cantor_core::error::Result;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.api.max_upload_bytes;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ingest-songs", post(handlers::ingest_songs))
        .route("/who-said", post(handlers::who_said))
        .route("/more-from-artist", post(handlers::more_from_artist))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind to the configured address and serve until the process exits.
pub async fn start_server(config: &CantorConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.general.bind_address, config.general.port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
