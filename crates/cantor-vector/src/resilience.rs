//! Timeout and bounded retry around external collaborator calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use cantor_core::config::IngestConfig;
use cantor_core::error::{CantorError, Result};

/// How a collaborator call is bounded: a per-attempt timeout plus up to
/// `max_retries` further attempts with linearly growing backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl CallPolicy {
    pub fn new(timeout: Duration, max_retries: u32, backoff: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            backoff,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            Duration::from_secs(config.collaborator_timeout_secs),
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Run `call` until it succeeds, fails with an input error, or the retry
    /// budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, collaborator: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match tokio::time::timeout(self.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => CantorError::Timeout {
                    collaborator: collaborator.to_string(),
                    secs: self.timeout.as_secs(),
                },
            };

            if err.is_input_error() || attempt >= self.max_retries {
                return Err(err);
            }
            attempt += 1;
            warn!(
                collaborator,
                attempt,
                max_retries = self.max_retries,
                error = %err,
                "Collaborator call failed, retrying"
            );
            tokio::time::sleep(self.backoff * attempt).await;
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}
