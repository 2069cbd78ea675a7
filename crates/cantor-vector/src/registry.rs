//! Track registry: track id -> speaker fingerprint and descriptive metadata.
//!
//! Besides the fingerprint map, the registry records which track ids have
//! been claimed by the ingestion pipeline. A claim covers every ingested
//! track, including tracks indexed without a fingerprint, so duplicate
//! uploads can be detected before any collaborator is called.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, RwLock};

use cantor_core::error::{CantorError, Result};
use cantor_core::types::TrackFingerprint;

#[derive(Debug, Default)]
pub struct TrackRegistry {
    fingerprints: RwLock<HashMap<String, TrackFingerprint>>,
    claimed: Mutex<HashSet<String>>,
}

impl TrackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the fingerprint for `track_id`.
    pub fn put(&self, track_id: impl Into<String>, fingerprint: TrackFingerprint) -> Result<()> {
        let mut map = self
            .fingerprints
            .write()
            .map_err(|e| CantorError::Storage(format!("Lock poisoned: {}", e)))?;
        map.insert(track_id.into(), fingerprint);
        Ok(())
    }

    /// Look up a fingerprint. Absent keys and a poisoned lock both yield `None`.
    pub fn get(&self, track_id: &str) -> Option<TrackFingerprint> {
        self.fingerprints.read().ok()?.get(track_id).cloned()
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.fingerprints
            .read()
            .map(|m| m.contains_key(track_id))
            .unwrap_or(false)
    }

    /// Registered fingerprints, oldest ingestion first.
    pub fn list(&self) -> Vec<TrackFingerprint> {
        let mut all: Vec<TrackFingerprint> = self
            .fingerprints
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default();
        all.sort_by(|a, b| {
            a.ingested_at
                .cmp(&b.ingested_at)
                .then_with(|| a.track_id.cmp(&b.track_id))
        });
        all
    }

    pub fn len(&self) -> usize {
        self.fingerprints.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Atomically claim `track_id` for ingestion.
    ///
    /// Returns `false` if the id was already claimed.
    pub fn claim(&self, track_id: &str) -> Result<bool> {
        let mut claimed = self
            .claimed
            .lock()
            .map_err(|e| CantorError::Storage(format!("Lock poisoned: {}", e)))?;
        Ok(claimed.insert(track_id.to_string()))
    }

    /// Drop a claim so the track may be ingested again.
    pub fn release(&self, track_id: &str) {
        if let Ok(mut claimed) = self.claimed.lock() {
            claimed.remove(track_id);
        }
    }

    pub fn is_claimed(&self, track_id: &str) -> bool {
        self.claimed
            .lock()
            .map(|c| c.contains(track_id))
            .unwrap_or(false)
    }

    /// Number of track ids that have been ingested, with or without a fingerprint.
    pub fn claimed_count(&self) -> usize {
        self.claimed.lock().map(|c| c.len()).unwrap_or(0)
    }
}
