//! Error types for the ranking engine.

use thiserror::Error;

/// Result type alias for ranking operations.
pub type Result<T> = std::result::Result<T, RankingError>;

/// Errors that can occur while ranking related cases.
///
/// An unknown target identifier is deliberately not here: it resolves to an
/// empty [`crate::RelatedCases`], not an error.
#[derive(Error, Debug)]
pub enum RankingError {
    /// Embedding error while computing the target baseline.
    #[error("embedding error: {0}")]
    Embedding(#[from] caserank_embeddings::EmbeddingError),

    /// Requested top-K was not a positive integer.
    #[error("top_k must be positive, got {requested}")]
    InvalidTopK { requested: usize },
}
