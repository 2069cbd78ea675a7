//! The owned bundle of stores shared by ingestion and queries.
//!
//! A `Catalog` is created once at startup and handed to the pipeline and the
//! query engine behind an `Arc`. Reads go straight to the individual stores;
//! writes go through [`Catalog::commit_track`], which serializes commits and
//! validates a track's vectors against both indices before touching either.

use std::sync::Mutex;

use serde::Serialize;
use tracing::debug;

use cantor_core::error::{CantorError, Result};
use cantor_core::types::{Segment, TrackFingerprint};

use crate::index::VectorIndex;
use crate::registry::TrackRegistry;

/// Everything a single track contributes to the stores.
#[derive(Debug, Clone)]
pub struct TrackCommit {
    /// One content embedding per segment, in segment order.
    pub vectors: Vec<Vec<f32>>,
    pub segments: Vec<Segment>,
    pub fingerprint: Option<TrackFingerprint>,
}

/// Point-in-time store sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub segments: usize,
    pub speakers: usize,
    pub fingerprinted_tracks: usize,
    pub ingested_tracks: usize,
}

#[derive(Debug, Default)]
pub struct Catalog {
    content: VectorIndex<Segment>,
    speakers: VectorIndex<String>,
    registry: TrackRegistry,
    commit_lock: Mutex<()>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-segment content embeddings.
    pub fn content(&self) -> &VectorIndex<Segment> {
        &self.content
    }

    /// Per-track speaker fingerprints keyed by track id.
    pub fn speakers(&self) -> &VectorIndex<String> {
        &self.speakers
    }

    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Commit one track's content batch and optional fingerprint.
    ///
    /// Returns whether the track was voice-linked. Dimension and finiteness
    /// checks run before any write, so a rejected commit leaves every store
    /// unchanged.
    pub fn commit_track(&self, commit: TrackCommit) -> Result<bool> {
        let TrackCommit {
            vectors,
            segments,
            fingerprint,
        } = commit;

        let _guard = self
            .commit_lock
            .lock()
            .map_err(|e| CantorError::Storage(format!("Lock poisoned: {}", e)))?;

        if let Some(first) = vectors.first() {
            if !self.content.accepts_dimension(first.len()) {
                return Err(CantorError::DimensionMismatch {
                    expected: self.content.dimension().unwrap_or(0),
                    actual: first.len(),
                });
            }
        }
        if let Some(fp) = &fingerprint {
            if !self.speakers.accepts_dimension(fp.speaker_vec.len()) {
                return Err(CantorError::DimensionMismatch {
                    expected: self.speakers.dimension().unwrap_or(0),
                    actual: fp.speaker_vec.len(),
                });
            }
            if fp.speaker_vec.iter().any(|v| !v.is_finite()) {
                return Err(CantorError::InvalidInput(
                    "speaker vector must have finite components".to_string(),
                ));
            }
        }

        let segment_count = segments.len();
        self.content.add(vectors, segments)?;

        let Some(fp) = fingerprint else {
            debug!(segments = segment_count, "Committed track without fingerprint");
            return Ok(false);
        };
        self.speakers
            .add(vec![fp.speaker_vec.clone()], vec![fp.track_id.clone()])?;
        self.registry.put(fp.track_id.clone(), fp)?;
        Ok(true)
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            segments: self.content.len(),
            speakers: self.speakers.len(),
            fingerprinted_tracks: self.registry.len(),
            ingested_tracks: self.registry.claimed_count(),
        }
    }
}
