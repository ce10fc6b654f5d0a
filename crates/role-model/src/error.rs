//! Error type shared by the training and serving sides of the encoding contract.

use thiserror::Error;

/// Errors raised while loading data, fitting, persisting or predicting.
///
/// Unknown categories and tokens are deliberately absent: they resolve to a
/// fallback encoding and are only logged.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A request field could not be interpreted (non-numeric, negative, missing).
    #[error("malformed input in field '{field}': {reason}")]
    MalformedInput { field: &'static str, reason: String },

    /// The training dataset is missing columns or contains unusable rows.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Fitting could not proceed (empty partition, no classes, ...).
    #[error("training error: {0}")]
    Training(String),

    /// Persisted artifacts are missing, corrupt, or from different runs.
    #[error("artifact mismatch: {0}")]
    ArtifactMismatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

impl ModelError {
    pub fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        ModelError::MalformedInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
