//! Cantor ingestion pipeline.
//!
//! For each uploaded track the pipeline:
//! 1. Uploads the audio and derives a track id from the returned URL
//! 2. Transcribes it into timestamped spans, dropping empty ones
//! 3. Embeds every retained segment
//! 4. Fingerprints the track's voice
//! 5. Commits segments, fingerprint and registry entry in one step
//!
//! Every collaborator call happens before the commit, so a failure at any
//! step leaves the catalog untouched. Failures are isolated per track.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cantor_core::config::IngestConfig;
use cantor_core::error::{CantorError, Result};
use cantor_core::types::{
    IngestSummary, Segment, TrackFingerprint, TrackOutcome, TrackUpload, TranscriptSpan,
};

use crate::catalog::{Catalog, TrackCommit};
use crate::embedding::{EmbeddingService, SpeakerEmbeddingService};
use crate::resilience::CallPolicy;
use crate::storage::StorageService;
use crate::transcription::TranscriptionService;

/// Derive a track id from its descriptive fields and source URL.
///
/// Format: `{artist}:{title}:{suffix}` with a 7-hex-digit suffix taken from a
/// UUID v5 of the URL, so distinct uploads get distinct ids and the same
/// upload always maps to the same id.
pub fn make_track_id(artist: &str, title: &str, source_url: &str) -> String {
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, source_url.as_bytes())
        .simple()
        .to_string();
    format!("{}:{}:{}", artist, title, &digest[..7])
}

/// Turn raw transcript spans into segments, discarding whitespace-only text.
fn usable_segments(
    spans: Vec<TranscriptSpan>,
    upload: &TrackUpload,
    source_url: &str,
    track_id: &str,
) -> Vec<Segment> {
    spans
        .into_iter()
        .filter_map(|span| {
            let text = span.text.trim();
            if text.is_empty() {
                debug!(track_id, start = span.start, "Dropping empty transcript span");
                return None;
            }
            Some(Segment {
                artist: upload.artist.clone(),
                title: upload.title.clone(),
                text: text.to_string(),
                start: span.start,
                end: span.end.max(span.start),
                speaker_label: span.speaker_label,
                source_url: source_url.to_string(),
                track_id: track_id.to_string(),
            })
        })
        .collect()
}

/// The Cantor ingestion pipeline.
///
/// Generic over its four collaborators so production clients and test
/// doubles plug in the same way.
pub struct IngestPipeline<S, T, E, F> {
    catalog: Arc<Catalog>,
    storage: S,
    transcriber: T,
    embedder: E,
    speaker: F,
    config: IngestConfig,
    policy: CallPolicy,
}

impl<S, T, E, F> IngestPipeline<S, T, E, F>
where
    S: StorageService,
    T: TranscriptionService,
    E: EmbeddingService,
    F: SpeakerEmbeddingService,
{
    pub fn new(
        catalog: Arc<Catalog>,
        storage: S,
        transcriber: T,
        embedder: E,
        speaker: F,
        config: IngestConfig,
    ) -> Self {
        let policy = CallPolicy::from_config(&config);
        Self {
            catalog,
            storage,
            transcriber,
            embedder,
            speaker,
            config,
            policy,
        }
    }

    /// Override the collaborator call policy.
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Ingest parallel lists of audio payloads, artists and titles.
    ///
    /// Fails up front if the lists disagree in length; otherwise behaves like
    /// [`IngestPipeline::ingest`].
    pub async fn ingest_batch(
        &self,
        files: Vec<Vec<u8>>,
        artists: Vec<String>,
        titles: Vec<String>,
    ) -> Result<IngestSummary> {
        if files.len() != artists.len() || files.len() != titles.len() {
            return Err(CantorError::BatchSizeMismatch {
                files: files.len(),
                artists: artists.len(),
                titles: titles.len(),
            });
        }
        let uploads = files
            .into_iter()
            .zip(artists)
            .zip(titles)
            .map(|((audio, artist), title)| TrackUpload {
                artist,
                title,
                audio,
            })
            .collect();
        Ok(self.ingest(uploads).await)
    }

    /// Ingest tracks one after another. A failing track is reported in the
    /// summary and does not affect the others.
    pub async fn ingest(&self, tracks: Vec<TrackUpload>) -> IngestSummary {
        let mut outcomes = Vec::with_capacity(tracks.len());
        for upload in tracks {
            outcomes.push(self.ingest_track(upload).await);
        }
        let summary = IngestSummary::from_outcomes(outcomes);
        info!(
            tracks = summary.tracks,
            segments_indexed = summary.segments_indexed,
            "Ingestion batch complete"
        );
        summary
    }

    /// Ingest a single track.
    pub async fn ingest_track(&self, upload: TrackUpload) -> TrackOutcome {
        match self.process_track(&upload).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    artist = %upload.artist,
                    title = %upload.title,
                    error = %e,
                    "Track ingestion failed"
                );
                TrackOutcome::Failed {
                    artist: upload.artist,
                    title: upload.title,
                    error: e.to_string(),
                }
            }
        }
    }

    async fn process_track(&self, upload: &TrackUpload) -> Result<TrackOutcome> {
        let storage = &self.storage;
        let audio = upload.audio.as_slice();
        let source_url = self
            .policy
            .run("storage", move || storage.upload(audio))
            .await?;
        if source_url.trim().is_empty() {
            return Err(CantorError::Upload("storage returned no URL".to_string()));
        }

        let track_id = make_track_id(&upload.artist, &upload.title, &source_url);

        let claimed = if self.config.reject_duplicates {
            if !self.catalog.registry().claim(&track_id)? {
                info!(track_id = %track_id, "Track already ingested, skipping");
                return Ok(TrackOutcome::Duplicate { track_id });
            }
            true
        } else {
            self.catalog.registry().claim(&track_id)?
        };

        let result = self.index_track(upload, &source_url, &track_id).await;
        let keep_claim = matches!(result, Ok(TrackOutcome::Indexed { .. }));
        if claimed && !keep_claim {
            self.catalog.registry().release(&track_id);
        }
        result
    }

    async fn index_track(
        &self,
        upload: &TrackUpload,
        source_url: &str,
        track_id: &str,
    ) -> Result<TrackOutcome> {
        let transcriber = &self.transcriber;
        let diarize = self.config.diarize;
        let spans = self
            .policy
            .run("transcription", move || transcriber.transcribe(source_url, diarize))
            .await?;

        let segments = usable_segments(spans, upload, source_url, track_id);
        if segments.is_empty() {
            info!(track_id, "Transcript produced no usable segments, skipping track");
            return Ok(TrackOutcome::Skipped {
                artist: upload.artist.clone(),
                title: upload.title.clone(),
                reason: "transcript produced no usable segments".to_string(),
            });
        }

        let embedder = &self.embedder;
        let mut vectors = Vec::with_capacity(segments.len());
        for segment in &segments {
            let text = segment.text.as_str();
            let vector = self
                .policy
                .run("embedding", move || embedder.embed(text))
                .await?;
            vectors.push(vector);
        }

        let speaker = &self.speaker;
        let speaker_vec = self
            .policy
            .run("speaker embedding", move || speaker.embed_speaker(source_url))
            .await?
            .filter(|v| !v.is_empty());
        if speaker_vec.is_none() {
            debug!(track_id, "No speaker fingerprint for track");
        }

        let fingerprint = speaker_vec.map(|speaker_vec| TrackFingerprint {
            artist: upload.artist.clone(),
            title: upload.title.clone(),
            track_id: track_id.to_string(),
            speaker_vec,
            ingested_at: Utc::now(),
        });

        let segment_count = segments.len();
        let voice_linked = self.catalog.commit_track(TrackCommit {
            vectors,
            segments,
            fingerprint,
        })?;

        info!(
            track_id,
            segments = segment_count,
            voice_linked,
            "Track ingested successfully"
        );
        Ok(TrackOutcome::Indexed {
            track_id: track_id.to_string(),
            segments: segment_count,
            voice_linked,
        })
    }

    /// Get a reference to the shared catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }
}
