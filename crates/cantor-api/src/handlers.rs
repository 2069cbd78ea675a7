//! Route handler functions for all API endpoints.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cantor_core::types::{IngestSummary, MoreFromArtistResponse, WhoSaidResponse};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoSaidRequest {
    pub quote: String,
    /// Content hits to consider; defaults to `search.default_k`.
    #[serde(default)]
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoreFromArtistRequest {
    pub track_id: String,
    /// Defaults to `search.default_top_n`.
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub segments: usize,
    pub tracks: usize,
    pub speakers: usize,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.catalog.stats();
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        segments: stats.segments,
        tracks: stats.ingested_tracks,
        speakers: stats.speakers,
    })
}

/// POST /ingest-songs - multipart form with repeated `files`, `artists` and
/// `titles` fields, matched up by position.
pub async fn ingest_songs(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestSummary>, ApiError> {
    let mut files = Vec::new();
    let mut artists = Vec::new();
    let mut titles = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => files.push(field.bytes().await?.to_vec()),
            Some("artists") => artists.push(field.text().await?),
            Some("titles") => titles.push(field.text().await?),
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    let summary = state.pipeline.ingest_batch(files, artists, titles).await?;
    info!(
        tracks = summary.tracks,
        segments = summary.segments_indexed,
        "Ingest request complete"
    );
    Ok(Json(summary))
}

/// POST /who-said
pub async fn who_said(
    State(state): State<AppState>,
    Json(body): Json<WhoSaidRequest>,
) -> Result<Json<WhoSaidResponse>, ApiError> {
    let k = body.k.unwrap_or(state.config.search.default_k);
    let response = state.engine.who_said(&body.quote, k).await?;
    Ok(Json(response))
}

/// POST /more-from-artist
pub async fn more_from_artist(
    State(state): State<AppState>,
    Json(body): Json<MoreFromArtistRequest>,
) -> Result<Json<MoreFromArtistResponse>, ApiError> {
    let top_n = body.top_n.unwrap_or(state.config.search.default_top_n);
    let response = state.engine.more_from_artist(&body.track_id, top_n)?;
    Ok(Json(response))
}
