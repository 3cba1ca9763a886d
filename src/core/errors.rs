//! Error types for the recommendation engine.

use std::path::PathBuf;

use thiserror::Error;

/// Recommendation engine error type.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Corpus source file missing, unreadable, or malformed.
    #[error("corpus load failed: {0}")]
    DataLoad(String),
    /// Corpus source is missing a required column.
    #[error("corpus is missing required column `{0}`")]
    MissingColumn(String),
    /// A component was used before being fitted.
    #[error("{0} used before fitting")]
    NotFitted(&'static str),
    /// Persisted model artifact does not exist.
    #[error("model artifact not found at {0}")]
    ArtifactNotFound(PathBuf),
    /// Persisted model artifact exists but cannot be decoded.
    #[error("model artifact unreadable: {0}")]
    ArtifactCorrupt(String),
    /// Fitted model could not be encoded for persistence.
    #[error("model artifact encode failed: {0}")]
    ArtifactEncode(String),
    /// Engine cache lock was poisoned by a panicking writer.
    #[error("engine state lock poisoned")]
    StatePoisoned,
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for recommendation operations.
pub type RecommendResult<T> = Result<T, RecommendError>;
