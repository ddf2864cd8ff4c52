//! # Related-Case Ranking
//!
//! This crate ranks, for a given help case, the top-K most semantically
//! similar other cases in a corpus using dense vector embeddings and cosine
//! similarity.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Ranking Service                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  corpus snapshot ──► target resolution ──► candidate scoring    │
//! │                                                  │              │
//! │                                                  ▼              │
//! │                        EmbeddingCache ──► EmbeddingProvider     │
//! │                                                  │              │
//! │                                                  ▼              │
//! │                        sort + truncate ──► RelatedCases         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use caserank_ranking::{HttpProvider, RankingConfig, RankingService};
//!
//! let provider = Arc::new(HttpProvider::new("http://localhost:8080/v1"));
//! let service = RankingService::new(provider, RankingConfig::default());
//! service.init().await?;
//!
//! let result = service.related_cases("HR-1042", &corpus, Some(5)).await?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod record;

pub use config::RankingConfig;
pub use engine::RankingService;
pub use error::{RankingError, Result};
pub use record::{CaseRecord, CaseStatus, RelatedCases, ScoredCase};

// Re-export from dependencies for convenience
pub use caserank_embeddings::{EmbeddingCache, EmbeddingProvider, HttpProvider};
