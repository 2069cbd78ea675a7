//! Embedding collaborators: text content embeddings and speaker fingerprints.
//!
//! - `EmbeddingService` turns a transcript segment or a quoted line into a
//!   fixed-dimension content vector.
//! - `SpeakerEmbeddingService` turns stored audio into a fixed-dimension
//!   voice fingerprint, when one can be computed.
//! - `MockEmbedding` / `MockSpeakerEmbedding` provide deterministic
//!   hash-based vectors for development and testing.

use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};

use cantor_core::error::{CantorError, Result};

use crate::storage::MemoryStorage;
use crate::transcription::split_voice_header;

/// Service for generating text embeddings.
///
/// Used for both ingestion (segment text) and queries (the quoted line), so
/// both sides land in the same vector space.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for the given text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Service for generating a track-level voice fingerprint.
pub trait SpeakerEmbeddingService: Send + Sync {
    /// Fingerprint the dominant voice of the audio at `url`.
    ///
    /// `Ok(None)` means no voice could be isolated; the track is still
    /// indexed for content but cannot be voice-linked.
    fn embed_speaker(&self, url: &str) -> impl Future<Output = Result<Option<Vec<f32>>>> + Send;
}

/// Deterministic unit vector derived from `seed`.
pub(crate) fn hash_to_vector(seed: &str, dimensions: usize) -> Vec<f32> {
    let mut result = Vec::with_capacity(dimensions);
    for i in 0..dimensions {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        i.hash(&mut hasher);
        let h = hasher.finish();
        let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
        result.push(val as f32);
    }

    let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in &mut result {
            *val /= norm;
        }
    }

    result
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based content vectors
// ---------------------------------------------------------------------------

/// Mock embedding service that returns deterministic 384-dimensional vectors.
///
/// Identical inputs always produce identical outputs, so a quote that
/// exactly matches a segment scores 1.0 against it.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub const DIMENSIONS: usize = 384;

    pub fn new() -> Self {
        Self
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(CantorError::Embedding("Cannot embed empty text".to_string()));
        }
        Ok(hash_to_vector(text, Self::DIMENSIONS))
    }

    fn dimensions(&self) -> usize {
        Self::DIMENSIONS
    }
}

// ---------------------------------------------------------------------------
// MockSpeakerEmbedding - voice vectors from the script header
// ---------------------------------------------------------------------------

/// Speaker embedder for scripts stored in [`MemoryStorage`].
///
/// Reads the `voice: <name>` header (see `MockTranscription`); every track
/// with the same name gets the same 192-dimensional vector. Scripts without
/// a header have no fingerprint.
#[derive(Debug, Clone)]
pub struct MockSpeakerEmbedding {
    storage: MemoryStorage,
}

impl MockSpeakerEmbedding {
    pub const DIMENSIONS: usize = 192;

    pub fn new(storage: MemoryStorage) -> Self {
        Self { storage }
    }
}

impl SpeakerEmbeddingService for MockSpeakerEmbedding {
    async fn embed_speaker(&self, url: &str) -> Result<Option<Vec<f32>>> {
        let bytes = self
            .storage
            .fetch(url)
            .ok_or_else(|| CantorError::SpeakerEmbedding(format!("no audio stored at {}", url)))?;
        let script = String::from_utf8_lossy(&bytes);
        let (voice, _) = split_voice_header(&script);
        Ok(voice.map(|name| hash_to_vector(&format!("voice:{}", name), Self::DIMENSIONS)))
    }
}
