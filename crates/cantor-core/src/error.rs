use thiserror::Error;

/// Top-level error type for the Cantor retrieval engine.
///
/// Variants fall into three groups: input errors surfaced straight to the
/// caller (`DimensionMismatch`, `LengthMismatch`, `BatchSizeMismatch`,
/// `UnknownTrack`, `EmptySpeakerIndex`, `InvalidInput`), collaborator
/// failures that abort a single track during ingestion (`Upload`,
/// `Transcription`, `Embedding`, `SpeakerEmbedding`, `Timeout`), and
/// infrastructure failures (`Config`, `Storage`, `Io`, `Serialization`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CantorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Speaker embedding error: {0}")]
    SpeakerEmbedding(String),

    #[error("{collaborator} timed out after {secs}s")]
    Timeout { collaborator: String, secs: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Length mismatch: {vectors} vectors but {metadata} metadata entries")]
    LengthMismatch { vectors: usize, metadata: usize },

    #[error("files, artists, titles sizes must match ({files}, {artists}, {titles})")]
    BatchSizeMismatch {
        files: usize,
        artists: usize,
        titles: usize,
    },

    #[error("Unknown track_id: {0}")]
    UnknownTrack(String),

    #[error("Speaker index is empty")]
    EmptySpeakerIndex,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CantorError {
    /// True for errors caused by the caller's request rather than by a
    /// collaborator or the engine itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CantorError::DimensionMismatch { .. }
                | CantorError::LengthMismatch { .. }
                | CantorError::BatchSizeMismatch { .. }
                | CantorError::UnknownTrack(_)
                | CantorError::EmptySpeakerIndex
                | CantorError::InvalidInput(_)
        )
    }
}

impl From<toml::de::Error> for CantorError {
    fn from(err: toml::de::Error) -> Self {
        CantorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CantorError {
    fn from(err: toml::ser::Error) -> Self {
        CantorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CantorError {
    fn from(err: serde_json::Error) -> Self {
        CantorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Cantor operations.
pub type Result<T> = std::result::Result<T, CantorError>;
