//! Error types for model operations

use thiserror::Error;

use crate::params::ParamError;

/// Errors raised by a speech model implementation.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A parameter set was rejected by the strict loader.
    #[error("parameter load rejected: {0}")]
    Params(#[from] ParamError),

    /// A batch with no samples was submitted.
    #[error("empty batch")]
    EmptyBatch,

    /// A forward or backward pass failed.
    #[error("inference failed: {reason}")]
    Inference {
        /// Description of the failure.
        reason: String,
    },
}
