//! Error types for the scoring engine

use thiserror::Error;

/// Errors raised by the scoring core.
///
/// `InsufficientData` and `InsufficientHistory` are expected conditions, not
/// failures: callers map the first to a vacuously false predicate and must
/// surface the second as "no anomaly signal".
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Insufficient data for {scope}: no qualifying commits")]
    InsufficientData { scope: String },

    #[error("Insufficient history for {developer}: no trained anomaly model")]
    InsufficientHistory { developer: String },

    #[error("Baseline for {scope} is stale; recompute before scoring")]
    StaleBaseline { scope: String },

    #[error("Model handle for {developer} was superseded by a retrain")]
    StaleModel { developer: String },

    #[error("Unknown developer: {username}")]
    UnknownDeveloper { username: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// True for the "not enough samples" family of conditions.
    pub fn is_insufficient(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientData { .. } | EngineError::InsufficientHistory { .. }
        )
    }
}
