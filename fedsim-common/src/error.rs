//! Error types for fedsim

use thiserror::Error;

/// Error types for configuration and bootstrap paths.
///
/// Crate-specific failures (dataset access, parameter shapes, aggregation)
/// live in their own crates; this type covers the concerns shared by every
/// binary: reading configuration files and validating their contents.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors.
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}
