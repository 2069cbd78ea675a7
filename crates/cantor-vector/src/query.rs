//! Read-side engine: "who said this line" and "more from this voice".
//!
//! Both queries only read the catalog. who-said embeds the quote, takes the
//! best content hit as the answer and expands it through the speaker index;
//! more-from-artist starts directly from a registered track's fingerprint.

use std::sync::Arc;

use tracing::debug;

use cantor_core::config::SearchConfig;
use cantor_core::error::{CantorError, Result};
use cantor_core::types::{
    MatchAnswer, MoreFromArtistResponse, Segment, TrackFingerprint, VoiceMatch, WhoSaidResponse,
};

use crate::catalog::Catalog;
use crate::embedding::EmbeddingService;
use crate::resilience::CallPolicy;

/// Round to `places` decimal digits.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Render seconds the way the answer sentence shows them: `0.0`, `1.2`, `12.25`.
fn format_seconds(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub struct QueryEngine<E> {
    catalog: Arc<Catalog>,
    embedder: E,
    config: SearchConfig,
    policy: CallPolicy,
}

impl<E: EmbeddingService> QueryEngine<E> {
    pub fn new(catalog: Arc<Catalog>, embedder: E, config: SearchConfig) -> Self {
        Self {
            catalog,
            embedder,
            config,
            policy: CallPolicy::default(),
        }
    }

    /// Override the policy used for the quote-embedding call.
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Find the segment that best matches `quote` and suggest other tracks
    /// sharing its voice.
    ///
    /// An empty content index, or no hits, yields a not-found response rather
    /// than an error.
    pub async fn who_said(&self, quote: &str, k: usize) -> Result<WhoSaidResponse> {
        let quote = quote.trim();
        if quote.is_empty() {
            return Err(CantorError::InvalidInput("quote must not be empty".to_string()));
        }
        if self.catalog.content().is_empty() {
            debug!("who-said on empty content index");
            return Ok(WhoSaidResponse::not_found());
        }

        let embedder = &self.embedder;
        let query = self
            .policy
            .run("embedding", move || embedder.embed(quote))
            .await?;
        // A malformed quote vector is the embedder's fault, not the caller's.
        let hits = self
            .catalog
            .content()
            .search(&query, k)
            .map_err(|e| match e {
                CantorError::DimensionMismatch { expected, actual } => {
                    CantorError::Embedding(format!(
                        "quote embedding has {} dimensions, content index holds {}",
                        actual, expected
                    ))
                }
                CantorError::InvalidInput(msg) => CantorError::Embedding(msg),
                other => other,
            })?;
        let Some(top) = hits.into_iter().next() else {
            return Ok(WhoSaidResponse::not_found());
        };

        let best = self.answer_from(&top.metadata, top.score);
        let neighbors = k.saturating_add(1).max(self.config.who_said_min_neighbors);
        let more_by_voice = match self.catalog.registry().get(&best.track_id) {
            Some(fp) if !self.catalog.speakers().is_empty() => {
                self.voice_neighbors(&fp, neighbors, None)?
            }
            _ => Vec::new(),
        };

        let answer = format!(
            "{} said it in “{}” [{}s–{}s]. I can search more songs by this voice if you want.",
            best.artist,
            best.title,
            format_seconds(best.timestamp[0]),
            format_seconds(best.timestamp[1]),
        );
        debug!(
            track_id = %best.track_id,
            score = best.match_score,
            suggestions = more_by_voice.len(),
            "who-said answered"
        );
        Ok(WhoSaidResponse::Found {
            answer,
            best,
            more_by_voice,
        })
    }

    /// List other tracks whose voice fingerprint is at least
    /// `voice_similarity_floor` similar to `track_id`'s.
    pub fn more_from_artist(&self, track_id: &str, top_n: usize) -> Result<MoreFromArtistResponse> {
        let fp = self
            .catalog
            .registry()
            .get(track_id)
            .ok_or_else(|| CantorError::UnknownTrack(track_id.to_string()))?;
        if self.catalog.speakers().is_empty() {
            return Err(CantorError::EmptySpeakerIndex);
        }

        let neighbors = top_n.saturating_add(1).max(self.config.more_from_min_neighbors);
        let results =
            self.voice_neighbors(&fp, neighbors, Some(self.config.voice_similarity_floor))?;
        Ok(MoreFromArtistResponse { results })
    }

    /// Search the speaker index with `fp`, dropping the track itself, hits
    /// under `floor`, and ids missing from the registry.
    fn voice_neighbors(
        &self,
        fp: &TrackFingerprint,
        neighbors: usize,
        floor: Option<f32>,
    ) -> Result<Vec<VoiceMatch>> {
        let hits = self.catalog.speakers().search(&fp.speaker_vec, neighbors)?;
        Ok(hits
            .into_iter()
            .filter(|hit| hit.metadata != fp.track_id)
            .filter(|hit| floor.map_or(true, |f| hit.score >= f))
            .filter_map(|hit| {
                let other = self.catalog.registry().get(&hit.metadata)?;
                Some(VoiceMatch {
                    artist: other.artist,
                    title: other.title,
                    track_id: other.track_id,
                    similarity: round_to(f64::from(hit.score), 4),
                })
            })
            .collect())
    }

    fn answer_from(&self, segment: &Segment, score: f32) -> MatchAnswer {
        MatchAnswer {
            artist: segment.artist.clone(),
            title: segment.title.clone(),
            timestamp: [round_to(segment.start, 2), round_to(segment.end, 2)],
            track_id: segment.track_id.clone(),
            source_url: segment.source_url.clone(),
            match_score: round_to(f64::from(score), 4),
            snippet: segment.text.chars().take(self.config.snippet_chars).collect(),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn policy(&self) -> CallPolicy {
        self.policy
    }
}
