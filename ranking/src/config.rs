//! Configuration for the ranking service.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::RankingService`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Candidates returned when the caller does not ask for a count.
    pub top_k: usize,

    /// Concurrent provider calls allowed. Left at 1, every call is
    /// serialized; raise only for providers that are safely reentrant.
    pub provider_concurrency: usize,

    /// Deadline for a single provider call, in milliseconds.
    pub provider_timeout_ms: u64,

    /// Bound on cached embeddings. `None` keeps every entry for the process
    /// lifetime, which is fine for small corpora.
    pub cache_max_entries: Option<usize>,
}

impl RankingConfig {
    /// Set the default top-K.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the provider concurrency cap.
    pub fn with_provider_concurrency(mut self, cap: usize) -> Self {
        self.provider_concurrency = cap;
        self
    }

    /// Set the per-call provider timeout in milliseconds.
    pub fn with_provider_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.provider_timeout_ms = timeout_ms;
        self
    }

    /// Bound the embedding cache.
    pub fn with_cache_max_entries(mut self, max_entries: usize) -> Self {
        self.cache_max_entries = Some(max_entries);
        self
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            provider_concurrency: 1,
            provider_timeout_ms: 30_000,
            cache_max_entries: None,
        }
    }
}
