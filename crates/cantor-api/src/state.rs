//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use cantor_core::config::CantorConfig;
use cantor_vector::{
    CallPolicy, Catalog, IngestPipeline, MemoryStorage, MockEmbedding, MockSpeakerEmbedding,
    MockTranscription, QueryEngine,
};

/// Pipeline wired to the in-process development collaborators.
pub type DevPipeline =
    IngestPipeline<MemoryStorage, MockTranscription, MockEmbedding, MockSpeakerEmbedding>;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. The catalog
/// does its own locking, so nothing here needs a `Mutex`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CantorConfig>,
    pub catalog: Arc<Catalog>,
    pub pipeline: Arc<DevPipeline>,
    pub engine: Arc<QueryEngine<MockEmbedding>>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: CantorConfig, pipeline: DevPipeline, engine: QueryEngine<MockEmbedding>) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::clone(pipeline.catalog()),
            pipeline: Arc::new(pipeline),
            engine: Arc::new(engine),
            start_time: Instant::now(),
        }
    }

    /// Build an empty catalog with the development collaborators, all
    /// sharing one [`MemoryStorage`].
    pub fn development(config: CantorConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let storage = MemoryStorage::new();
        let pipeline = IngestPipeline::new(
            Arc::clone(&catalog),
            storage.clone(),
            MockTranscription::new(storage.clone()),
            MockEmbedding::new(),
            MockSpeakerEmbedding::new(storage),
            config.ingest.clone(),
        );
        let engine = QueryEngine::new(catalog, MockEmbedding::new(), config.search.clone())
            .with_policy(CallPolicy::from_config(&config.ingest));
        Self::new(config, pipeline, engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_development_query_policy_follows_ingest_config() {
        let mut config = CantorConfig::default();
        config.ingest.collaborator_timeout_secs = 7;
        config.ingest.max_retries = 5;
        config.ingest.retry_backoff_ms = 10;

        let state = AppState::development(config);
        let policy = state.engine.policy();
        assert_eq!(policy.timeout, Duration::from_secs(7));
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.backoff, Duration::from_millis(10));
    }

    #[test]
    fn test_development_shares_one_catalog() {
        let state = AppState::development(CantorConfig::default());
        assert!(Arc::ptr_eq(&state.catalog, state.engine.catalog()));
        assert!(Arc::ptr_eq(&state.catalog, state.pipeline.catalog()));
    }
}
