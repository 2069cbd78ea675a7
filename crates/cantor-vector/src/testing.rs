//! Scripted collaborator doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use cantor_core::error::{CantorError, Result};
use cantor_core::types::TranscriptSpan;

use crate::embedding::{hash_to_vector, EmbeddingService, SpeakerEmbeddingService};
use crate::index::normalize_l2;
use crate::pipeline::IngestPipeline;
use crate::storage::StorageService;
use crate::transcription::TranscriptionService;

pub type ScriptedPipeline =
    IngestPipeline<ScriptedBackend, ScriptedBackend, ScriptedBackend, ScriptedBackend>;

#[derive(Debug, Default)]
struct Script {
    transcripts: HashMap<String, Vec<TranscriptSpan>>,
    voices: HashMap<String, Vec<f32>>,
    embeddings: HashMap<String, Vec<f32>>,
    failing_texts: HashSet<String>,
}

/// Plays every collaborator role from a shared script.
///
/// Uploads are keyed by their UTF-8 payload: uploading `b"a"` yields the URL
/// `mem://a`, whose transcript and voice come from `script("a", ..)` and
/// `voice("a", ..)`. Texts without an explicit embedding get a hashed
/// 384-dimensional vector.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, key: &str, spans: Vec<TranscriptSpan>) {
        self.script
            .lock()
            .unwrap()
            .transcripts
            .insert(key.to_string(), spans);
    }

    pub fn voice(&self, key: &str, vector: Vec<f32>) {
        self.script
            .lock()
            .unwrap()
            .voices
            .insert(key.to_string(), vector);
    }

    pub fn embedding(&self, text: &str, vector: Vec<f32>) {
        self.script
            .lock()
            .unwrap()
            .embeddings
            .insert(text.to_string(), vector);
    }

    pub fn fail_embedding(&self, text: &str) {
        self.script
            .lock()
            .unwrap()
            .failing_texts
            .insert(text.to_string());
    }

    fn key(url: &str) -> &str {
        url.strip_prefix("mem://").unwrap_or(url)
    }
}

impl StorageService for ScriptedBackend {
    async fn upload(&self, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(CantorError::Upload("empty payload".to_string()));
        }
        Ok(format!("mem://{}", String::from_utf8_lossy(bytes)))
    }
}

impl TranscriptionService for ScriptedBackend {
    async fn transcribe(&self, url: &str, _diarize: bool) -> Result<Vec<TranscriptSpan>> {
        self.script
            .lock()
            .unwrap()
            .transcripts
            .get(Self::key(url))
            .cloned()
            .ok_or_else(|| CantorError::Transcription(format!("unscripted url {}", url)))
    }
}

impl EmbeddingService for ScriptedBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let script = self.script.lock().unwrap();
        if script.failing_texts.contains(text) {
            return Err(CantorError::Embedding(format!("scripted failure for {:?}", text)));
        }
        Ok(script
            .embeddings
            .get(text)
            .cloned()
            .unwrap_or_else(|| hash_to_vector(text, 384)))
    }

    fn dimensions(&self) -> usize {
        384
    }
}

impl SpeakerEmbeddingService for ScriptedBackend {
    async fn embed_speaker(&self, url: &str) -> Result<Option<Vec<f32>>> {
        Ok(self.script.lock().unwrap().voices.get(Self::key(url)).cloned())
    }
}

/// `values` scaled to unit length.
pub fn unit(values: &[f32]) -> Vec<f32> {
    let mut v = values.to_vec();
    normalize_l2(&mut v);
    v
}

/// Unit vector in 3-space whose cosine to `[1, 0, 0]` is `cos`.
pub fn at_cosine(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt(), 0.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_normalizes() {
        assert_eq!(unit(&[3.0, 4.0]), vec![0.6, 0.8]);
        assert_eq!(unit(&[0.0, 2.0, 0.0]), vec![0.0, 1.0, 0.0]);
    }
}
