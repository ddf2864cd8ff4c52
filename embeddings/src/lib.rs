//! # Embeddings
//!
//! This crate provides embedding acquisition and similarity scoring for the
//! related-case ranking core.
//!
//! ## Features
//!
//! - **Provider Boundary**: Convert case text to dense vectors via an
//!   init/embed lifecycle
//! - **Caching**: One embedding per normalized text, with in-flight request
//!   coalescing so concurrent misses share a single provider call
//! - **Similarity**: Cosine similarity with explicit dimension checking
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embeddings System                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingCache ──► EmbeddingProvider ──► Embedding             │
//! │       │                    │                  │                 │
//! │       ▼                    ▼                  ▼                 │
//! │  coalesced misses     HttpProvider      cosine_similarity       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod provider;
pub mod similarity;

pub use cache::{CacheStats, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use provider::{EmbeddingProvider, HttpProvider};
pub use similarity::{cosine_similarity, normalize};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings (varies by model).
pub const DEFAULT_DIMENSION: usize = 384; // MiniLM-class sentence encoders
