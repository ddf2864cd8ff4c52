//! Related-case ranking engine implementation.

use std::sync::Arc;
use std::time::Duration;

use ordered_float::OrderedFloat;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use caserank_embeddings::{CacheStats, EmbeddingCache, EmbeddingProvider, cosine_similarity};

use crate::config::RankingConfig;
use crate::error::{RankingError, Result};
use crate::record::{CaseRecord, RelatedCases, ScoredCase};

/// Ranks, for a target case, the most semantically similar other cases in a
/// corpus snapshot.
///
/// The service owns the embedding cache and the provider handle; construct
/// it once at process start and hand it by reference to request handlers.
/// The record store supplies the corpus per call and keeps ownership of it.
pub struct RankingService {
    /// The embedding capability.
    provider: Arc<dyn EmbeddingProvider>,

    /// Process-wide embedding cache.
    cache: Arc<EmbeddingCache>,

    /// Configuration.
    config: RankingConfig,
}

impl RankingService {
    /// Create a new ranking service over the given provider.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: RankingConfig) -> Self {
        let mut cache = EmbeddingCache::new(Arc::clone(&provider))
            .with_concurrency(config.provider_concurrency)
            .with_provider_timeout(Duration::from_millis(config.provider_timeout_ms));
        if let Some(max_entries) = config.cache_max_entries {
            cache = cache.with_max_entries(max_entries);
        }

        Self {
            provider,
            cache: Arc::new(cache),
            config,
        }
    }

    /// Initialize the embedding provider.
    ///
    /// Idempotent. Ranking before this completes surfaces the provider's
    /// `NotInitialized`.
    pub async fn init(&self) -> Result<()> {
        self.provider.init().await?;
        info!(provider = self.provider.name(), "ranking service ready");
        Ok(())
    }

    /// Rank the cases most similar to `case_number` within `corpus`.
    ///
    /// `top_k` falls back to the configured default when `None`; zero is
    /// rejected. An unknown identifier yields the defined empty result. The
    /// target's own embedding failure fails the request; a candidate's
    /// failure only excludes that candidate (counted in `skipped`).
    pub async fn related_cases(
        &self,
        case_number: &str,
        corpus: &[CaseRecord],
        top_k: Option<usize>,
    ) -> Result<RelatedCases> {
        let top_k = match top_k {
            Some(0) => return Err(RankingError::InvalidTopK { requested: 0 }),
            Some(k) => k,
            None => self.config.top_k,
        };

        let Some(target) = corpus.iter().find(|c| c.matches(case_number)) else {
            debug!(case_number, "target case not found");
            return Ok(RelatedCases::not_found());
        };

        // The baseline every candidate is compared against. Nothing to rank
        // without it, so this failure is fatal to the request.
        let target_embedding = self.cache.get_or_compute(&target.embedding_text()).await?;

        let mut tasks = JoinSet::new();
        for (index, record) in corpus.iter().enumerate() {
            if record.matches(&target.case_number) {
                continue;
            }

            let cache = Arc::clone(&self.cache);
            let target_embedding = Arc::clone(&target_embedding);
            let record = record.clone();
            tasks.spawn(async move {
                let outcome = match cache.get_or_compute(&record.embedding_text()).await {
                    Ok(embedding) => cosine_similarity(&target_embedding, &embedding),
                    Err(err) => Err(err),
                };
                (index, record, outcome)
            });
        }

        let mut scored: Vec<(usize, ScoredCase)> = Vec::new();
        let mut skipped = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, record, Ok(similarity))) => {
                    let similarity = if similarity.is_nan() { 0.0 } else { similarity };
                    let relevance = (similarity * 100.0).round().clamp(0.0, 100.0) as u8;
                    scored.push((
                        index,
                        ScoredCase {
                            record,
                            similarity,
                            relevance,
                        },
                    ));
                }
                Ok((_, record, Err(err))) => {
                    skipped += 1;
                    warn!(
                        case_number = %record.case_number,
                        error = %err,
                        "candidate skipped, embedding unavailable"
                    );
                }
                Err(err) => {
                    skipped += 1;
                    warn!(error = %err, "candidate task failed");
                }
            }
        }

        // Completion order of the concurrent tasks is arbitrary; the sort
        // alone decides output order. Descending similarity, ties broken by
        // corpus position.
        scored.sort_by_key(|(index, candidate)| {
            (std::cmp::Reverse(OrderedFloat(candidate.similarity)), *index)
        });
        scored.truncate(top_k);

        debug!(
            case_number = %target.case_number,
            returned = scored.len(),
            skipped,
            "ranked related cases"
        );

        Ok(RelatedCases {
            main_case: Some(target.clone()),
            related: scored.into_iter().map(|(_, candidate)| candidate).collect(),
            skipped,
        })
    }

    /// Embedding cache statistics.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}
