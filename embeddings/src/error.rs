//! Error types for the embeddings system.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embeddings system.
///
/// The enum is `Clone` so that a single in-flight computation failure can be
/// broadcast to every coalesced waiter. Source errors (reqwest, serde) are
/// rendered into the message at the provider boundary instead of being held
/// via `#[from]`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Embedding attempted before the provider finished initializing.
    #[error("embedding provider not initialized")]
    NotInitialized,

    /// Provider is missing configuration or unreachable.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider failed while computing a vector.
    #[error("embedding computation failed: {0}")]
    ComputationFailed(String),

    /// Provider call exceeded the configured deadline.
    #[error("embedding provider timed out after {timeout_ms}ms")]
    ProviderTimeout { timeout_ms: u64 },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Provider returned a body we could not use.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Two embeddings of different length were compared.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding input was empty after trimming.
    #[error("embedding input text is empty")]
    EmptyText,
}
