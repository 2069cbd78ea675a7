//! Cantor vector crate - segment and voice indexes, collaborators, ingestion and queries.
//!
//! Provides an in-memory cosine-similarity index, the track registry and
//! catalog that tie content and voice indexes together, collaborator traits
//! with development implementations, the ingestion pipeline, and the
//! who-said / more-from-artist query engine.

pub mod catalog;
pub mod embedding;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod resilience;
pub mod storage;
pub mod transcription;

#[cfg(test)]
mod testing;

pub use catalog::{Catalog, CatalogStats, TrackCommit};
pub use embedding::{EmbeddingService, MockEmbedding, MockSpeakerEmbedding, SpeakerEmbeddingService};
pub use index::{SearchHit, VectorIndex};
pub use pipeline::{make_track_id, IngestPipeline};
pub use query::QueryEngine;
pub use registry::TrackRegistry;
pub use resilience::CallPolicy;
pub use storage::{MemoryStorage, StorageService};
pub use transcription::{MockTranscription, TranscriptionService};
