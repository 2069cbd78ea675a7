use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Stored records
// =============================================================================

/// One transcribed, timestamped span of one track.
///
/// Created once while its parent track is ingested and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub artist: String,
    pub title: String,
    /// Trimmed, non-empty transcript text.
    pub text: String,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds, never before `start`.
    pub end: f64,
    /// Diarization tag, when the transcriber produced one.
    pub speaker_label: Option<String>,
    /// Locator of the uploaded audio.
    pub source_url: String,
    /// Key into the track registry.
    pub track_id: String,
}

/// A track's dominant-voice embedding plus descriptive metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackFingerprint {
    pub artist: String,
    pub title: String,
    pub track_id: String,
    pub speaker_vec: Vec<f32>,
    pub ingested_at: DateTime<Utc>,
}

// =============================================================================
// Collaborator payloads
// =============================================================================

/// A raw span returned by the transcription collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSpan {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub speaker_label: Option<String>,
}

impl TranscriptSpan {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            speaker_label: None,
        }
    }

    pub fn with_speaker(mut self, label: impl Into<String>) -> Self {
        self.speaker_label = Some(label.into());
        self
    }
}

/// One track submitted for ingestion.
#[derive(Clone, Debug)]
pub struct TrackUpload {
    pub artist: String,
    pub title: String,
    pub audio: Vec<u8>,
}

impl TrackUpload {
    pub fn new(artist: impl Into<String>, title: impl Into<String>, audio: Vec<u8>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            audio,
        }
    }
}

// =============================================================================
// Ingestion results
// =============================================================================

/// What happened to a single track during ingestion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrackOutcome {
    /// Segments were committed to the content index.
    Indexed {
        track_id: String,
        segments: usize,
        /// Whether a speaker fingerprint was registered for the track.
        voice_linked: bool,
    },
    /// Nothing usable came back from transcription; no store was touched.
    Skipped {
        artist: String,
        title: String,
        reason: String,
    },
    /// The track id was already ingested.
    Duplicate { track_id: String },
    /// A collaborator failed; no store was touched.
    Failed {
        artist: String,
        title: String,
        error: String,
    },
}

impl TrackOutcome {
    pub fn segments_indexed(&self) -> usize {
        match self {
            TrackOutcome::Indexed { segments, .. } => *segments,
            _ => 0,
        }
    }
}

/// Aggregate result of an ingestion batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub success: bool,
    /// Number of tracks submitted in the batch.
    pub tracks: usize,
    /// Segments committed across every track in the batch.
    pub segments_indexed: usize,
    pub outcomes: Vec<TrackOutcome>,
}

impl IngestSummary {
    pub fn from_outcomes(outcomes: Vec<TrackOutcome>) -> Self {
        Self {
            success: true,
            tracks: outcomes.len(),
            segments_indexed: outcomes.iter().map(TrackOutcome::segments_indexed).sum(),
            outcomes,
        }
    }
}

// =============================================================================
// Query results
// =============================================================================

/// The authoritative content match for a quoted line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchAnswer {
    pub artist: String,
    pub title: String,
    /// `[start, end]` rounded to two decimals.
    pub timestamp: [f64; 2],
    pub track_id: String,
    pub source_url: String,
    /// Cosine similarity rounded to four decimals.
    pub match_score: f64,
    pub snippet: String,
}

/// Another track that appears to share a voice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoiceMatch {
    pub artist: String,
    pub title: String,
    pub track_id: String,
    /// Speaker-fingerprint cosine similarity rounded to four decimals.
    pub similarity: f64,
}

/// Response to a who-said query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhoSaidResponse {
    Found {
        answer: String,
        best: MatchAnswer,
        more_by_voice: Vec<VoiceMatch>,
    },
    NotFound {
        answer: String,
        candidates: Vec<MatchAnswer>,
    },
}

impl WhoSaidResponse {
    pub const NOT_FOUND_ANSWER: &'static str = "I couldn't find that line.";

    pub fn not_found() -> Self {
        WhoSaidResponse::NotFound {
            answer: Self::NOT_FOUND_ANSWER.to_string(),
            candidates: Vec::new(),
        }
    }

    pub fn best(&self) -> Option<&MatchAnswer> {
        match self {
            WhoSaidResponse::Found { best, .. } => Some(best),
            WhoSaidResponse::NotFound { .. } => None,
        }
    }

    pub fn more_by_voice(&self) -> &[VoiceMatch] {
        match self {
            WhoSaidResponse::Found { more_by_voice, .. } => more_by_voice,
            WhoSaidResponse::NotFound { .. } => &[],
        }
    }
}

/// Response to a more-from-artist query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoreFromArtistResponse {
    pub results: Vec<VoiceMatch>,
}
