//! Storage collaborator: accepts raw audio and returns a locator URL.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use cantor_core::error::{CantorError, Result};

/// Service that stores uploaded audio and hands back a URL other
/// collaborators can read it from.
pub trait StorageService: Send + Sync {
    /// Store `bytes` and return the URL of the stored object.
    fn upload(&self, bytes: &[u8]) -> impl Future<Output = Result<String>> + Send;
}

/// Content-addressed in-memory blob store.
///
/// Identical payloads map to the same `memory://blobs/<hash>` URL, so
/// re-uploading a track yields the same track id. Cloning shares the
/// underlying blobs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub const SCHEME: &'static str = "memory://blobs/";

    pub fn new() -> Self {
        Self::default()
    }

    /// Read back a stored blob.
    pub fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        self.blobs.read().ok()?.get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn url_for(bytes: &[u8]) -> String {
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        format!("{}{:016x}", Self::SCHEME, hasher.finish())
    }
}

impl StorageService for MemoryStorage {
    async fn upload(&self, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(CantorError::Upload("empty audio payload".to_string()));
        }
        let url = Self::url_for(bytes);
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| CantorError::Storage(format!("Lock poisoned: {}", e)))?;
        blobs.entry(url.clone()).or_insert_with(|| bytes.to_vec());
        Ok(url)
    }
}
