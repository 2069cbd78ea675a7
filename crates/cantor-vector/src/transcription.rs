//! Transcription collaborator and a text-driven development implementation.

use std::future::Future;

use cantor_core::error::{CantorError, Result};
use cantor_core::types::TranscriptSpan;

use crate::storage::MemoryStorage;

/// Service that turns stored audio into timestamped text spans.
pub trait TranscriptionService: Send + Sync {
    /// Transcribe the audio at `url`, splitting by speaker when `diarize` is set.
    fn transcribe(
        &self,
        url: &str,
        diarize: bool,
    ) -> impl Future<Output = Result<Vec<TranscriptSpan>>> + Send;
}

/// Width of the window assigned to lines without explicit timestamps.
const DEFAULT_SPAN_SECS: f64 = 2.0;

/// Transcriber that reads UTF-8 "scripts" uploaded to [`MemoryStorage`].
///
/// Script format, one span per non-empty line:
///
/// ```text
/// voice: indila
/// [0.0-1.2] hello world
/// [1.2-2.5] SPEAKER_1: goodbye now
/// a line with no timestamp gets the next 2-second window
/// ```
///
/// The optional `voice:` header is consumed by the speaker embedder and is
/// not transcribed.
#[derive(Debug, Clone)]
pub struct MockTranscription {
    storage: MemoryStorage,
}

impl MockTranscription {
    pub fn new(storage: MemoryStorage) -> Self {
        Self { storage }
    }
}

impl TranscriptionService for MockTranscription {
    async fn transcribe(&self, url: &str, diarize: bool) -> Result<Vec<TranscriptSpan>> {
        let bytes = self
            .storage
            .fetch(url)
            .ok_or_else(|| CantorError::Transcription(format!("no audio stored at {}", url)))?;
        let script = String::from_utf8(bytes).map_err(|_| {
            CantorError::Transcription("development transcriber expects UTF-8 scripts".to_string())
        })?;
        let (_, body) = split_voice_header(&script);
        Ok(parse_script(body, diarize))
    }
}

/// Split an optional leading `voice: <name>` line off a script.
pub(crate) fn split_voice_header(script: &str) -> (Option<&str>, &str) {
    let trimmed = script.trim_start();
    let (first, rest) = match trimmed.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (trimmed, ""),
    };
    match first.trim().strip_prefix("voice:") {
        Some(name) if !name.trim().is_empty() => (Some(name.trim()), rest),
        _ => (None, trimmed),
    }
}

fn parse_script(body: &str, diarize: bool) -> Vec<TranscriptSpan> {
    let mut cursor = 0.0f64;
    let mut spans = Vec::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (window, rest) = parse_window(line);
        let (start, end) = window.unwrap_or((cursor, cursor + DEFAULT_SPAN_SECS));
        cursor = end;

        let (label, text) = match parse_speaker(rest) {
            Some((label, text)) if diarize => (Some(label), text),
            Some((_, text)) => (None, text),
            None => (None, rest),
        };

        spans.push(TranscriptSpan {
            text: text.to_string(),
            start,
            end,
            speaker_label: label.map(str::to_string),
        });
    }

    spans
}

/// Parse a `[start-end]` prefix.
fn parse_window(line: &str) -> (Option<(f64, f64)>, &str) {
    let Some(inner_and_rest) = line.strip_prefix('[') else {
        return (None, line);
    };
    let Some((inner, rest)) = inner_and_rest.split_once(']') else {
        return (None, line);
    };
    let parsed = inner
        .split_once('-')
        .and_then(|(s, e)| Some((s.trim().parse::<f64>().ok()?, e.trim().parse::<f64>().ok()?)));
    match parsed {
        Some(window) => (Some(window), rest.trim()),
        None => (None, line),
    }
}

/// Parse a `SPEAKER_<n>:` prefix.
fn parse_speaker(text: &str) -> Option<(&str, &str)> {
    let (label, rest) = text.split_once(':')?;
    if label.starts_with("SPEAKER_") && !label.contains(char::is_whitespace) {
        Some((label, rest.trim()))
    } else {
        None
    }
}
