//! Embedding cache with in-flight request coalescing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, watch};
use tracing::{debug, info, warn};

use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;
use crate::similarity::normalize;
use crate::Embedding;

/// Broadcast slot for one in-flight computation: `None` until the provider
/// call settles.
type Slot = Option<std::result::Result<Arc<Embedding>, EmbeddingError>>;

/// Cache entry for an embedding.
struct CacheEntry {
    /// The embedding vector, unit length.
    vector: Arc<Embedding>,

    /// Insertion order, for the optional size-bound eviction.
    seq: u64,
}

/// Mutable cache state: stored entries plus the in-flight deduplication map,
/// both keyed by normalized text and guarded by one lock.
#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, watch::Receiver<Slot>>,
    seq: u64,
}

impl CacheState {
    fn insert(&mut self, key: String, vector: Arc<Embedding>, max_entries: Option<usize>) {
        if let Some(max) = max_entries {
            if !self.entries.contains_key(&key) && self.entries.len() >= max {
                // Evict the oldest insertion.
                if let Some(oldest) = self
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.seq)
                    .map(|(k, _)| k.clone())
                {
                    self.entries.remove(&oldest);
                }
            }
        }

        let seq = self.seq;
        self.seq += 1;
        self.entries.insert(key, CacheEntry { vector, seq });
    }
}

/// Cache for embeddings to avoid redundant provider calls.
///
/// Texts differing only in case or surrounding whitespace share one entry.
/// Concurrent misses for the same key share a single provider call: the
/// computation runs on a detached task and every waiter subscribes to its
/// result, so an issued provider call completes and populates the cache even
/// if the requesters are cancelled. A failed computation is broadcast to its
/// waiters and leaves the key absent so a later call can retry.
///
/// Entries are never invalidated within a process lifetime. The key is the
/// text, not the record identifier — if a record's description is edited,
/// the old entry lingers until the cache (or process) is replaced.
pub struct EmbeddingCache {
    /// The provider consulted on cache misses.
    provider: Arc<dyn EmbeddingProvider>,

    /// Entries and in-flight computations.
    state: Arc<Mutex<CacheState>>,

    /// Bounds concurrent provider calls. Defaults to one permit: in-process
    /// inference engines are commonly not reentrant.
    permits: Arc<Semaphore>,

    /// Deadline for a single provider call.
    provider_timeout: Duration,

    /// Maximum cache size; unbounded when `None`.
    max_entries: Option<usize>,
}

impl EmbeddingCache {
    /// Create a new unbounded cache over the given provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(Mutex::new(CacheState::default())),
            permits: Arc::new(Semaphore::new(1)),
            provider_timeout: Duration::from_secs(30),
            max_entries: None,
        }
    }

    /// Allow up to `cap` concurrent provider calls.
    pub fn with_concurrency(mut self, cap: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(cap.max(1)));
        self
    }

    /// Set the per-call provider timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Bound the cache, evicting the oldest entry once full.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Return the cached embedding for `text`, computing it on first request.
    ///
    /// The cache key is the trimmed, lowercased text; the provider sees the
    /// trimmed text with its original casing.
    pub async fn get_or_compute(&self, text: &str) -> Result<Arc<Embedding>> {
        let key = cache_key(text);
        if key.is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let mut rx = {
            let mut state = self.state.lock().await;

            if let Some(entry) = state.entries.get(&key) {
                debug!(key = %key, "embedding cache hit");
                return Ok(Arc::clone(&entry.vector));
            }

            match state.in_flight.get(&key) {
                Some(rx) => {
                    debug!(key = %key, "joining in-flight embedding computation");
                    rx.clone()
                }
                None => {
                    let (tx, rx) = watch::channel(None);
                    state.in_flight.insert(key.clone(), rx.clone());
                    self.spawn_compute(key.clone(), text.trim().to_string(), tx);
                    rx
                }
            }
        };

        // Clone the settled slot out so the watch read guard is not held
        // across an await.
        let outcome = match rx.wait_for(|slot| slot.is_some()).await {
            Ok(slot) => (*slot).clone(),
            Err(_) => None,
        };
        match outcome {
            Some(Ok(embedding)) => Ok(embedding),
            Some(Err(err)) => Err(err),
            // Sender dropped without settling. The computation task cannot
            // reach this under normal operation; unpoison the key so later
            // calls can retry.
            None => {
                let mut state = self.state.lock().await;
                let dead = state
                    .in_flight
                    .get(&key)
                    .is_some_and(|stale| stale.has_changed().is_err());
                if dead {
                    state.in_flight.remove(&key);
                }
                Err(EmbeddingError::ComputationFailed(
                    "embedding task ended without a result".to_string(),
                ))
            }
        }
    }

    /// Drop every cached entry.
    ///
    /// The escape hatch for corpus edits: the next ranking recomputes from
    /// the provider.
    pub async fn clear(&self) {
        self.state.lock().await.entries.clear();
        info!("cleared embedding cache");
    }

    /// Get cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        CacheStats {
            entries: state.entries.len(),
            max_entries: self.max_entries,
        }
    }

    /// Run the provider call on a detached task and broadcast the outcome.
    fn spawn_compute(&self, key: String, text: String, tx: watch::Sender<Slot>) {
        let provider = Arc::clone(&self.provider);
        let permits = Arc::clone(&self.permits);
        let state = Arc::clone(&self.state);
        let timeout = self.provider_timeout;
        let max_entries = self.max_entries;

        tokio::spawn(async move {
            let result = compute(provider, permits, timeout, &text).await;

            let mut state = state.lock().await;
            match &result {
                Ok(embedding) => {
                    state.insert(key.clone(), Arc::clone(embedding), max_entries);
                    debug!(key = %key, "cached embedding");
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "embedding computation failed, key left uncached");
                }
            }
            state.in_flight.remove(&key);
            drop(state);

            // Waiters may have been cancelled; the cache write above stands
            // regardless.
            let _ = tx.send(Some(result));
        });
    }
}

/// Normalize a text into its cache key.
fn cache_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// One provider call: bounded by the semaphore, subject to the timeout,
/// normalized to unit length on success.
async fn compute(
    provider: Arc<dyn EmbeddingProvider>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    text: &str,
) -> std::result::Result<Arc<Embedding>, EmbeddingError> {
    let _permit = permits
        .acquire()
        .await
        .map_err(|_| EmbeddingError::ProviderUnavailable("provider permits closed".to_string()))?;

    let mut vector = match tokio::time::timeout(timeout, provider.embed(text)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(EmbeddingError::ProviderTimeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    };

    normalize(&mut vector);
    Ok(Arc::new(vector))
}

/// Statistics about the embedding cache.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of entries in cache.
    pub entries: usize,

    /// Maximum cache size, if bounded.
    pub max_entries: Option<usize>,
}
