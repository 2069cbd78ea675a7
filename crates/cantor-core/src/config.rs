use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CantorError, Result};

/// Top-level configuration for the Cantor service.
///
/// Loaded from `~/.cantor/config.toml` by default. Every section falls back
/// to its defaults when omitted, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CantorConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl CantorConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CantorConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CantorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// HTTP server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Query tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default number of content hits for who-said.
    pub default_k: usize,
    /// Default number of results for more-from-artist.
    pub default_top_n: usize,
    /// Minimum voice similarity for two tracks to count as the same voice.
    pub voice_similarity_floor: f32,
    /// Maximum characters of segment text returned as a snippet.
    pub snippet_chars: usize,
    /// Lower bound on speaker neighbors fetched during who-said expansion.
    pub who_said_min_neighbors: usize,
    /// Lower bound on speaker neighbors fetched for more-from-artist.
    pub more_from_min_neighbors: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_k: 5,
            default_top_n: 5,
            voice_similarity_floor: 0.6,
            snippet_chars: 140,
            who_said_min_neighbors: 3,
            more_from_min_neighbors: 2,
        }
    }
}

/// Ingestion and collaborator-call settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Request speaker diarization from the transcription service.
    pub diarize: bool,
    /// Per-call timeout for every external collaborator.
    pub collaborator_timeout_secs: u64,
    /// Retries after the first failed collaborator call.
    pub max_retries: u32,
    /// Base backoff between retries; attempt `n` waits `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
    /// Skip tracks whose id was already ingested instead of overwriting.
    pub reject_duplicates: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            diarize: true,
            collaborator_timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 250,
            reject_duplicates: true,
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Maximum request body size, covering multipart audio uploads.
    pub max_upload_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}
