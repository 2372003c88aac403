//! Error types for dataset access
//!
//! Distinguishes structural failures (an unreadable or malformed manifest,
//! which abort client construction) from per-sample audio failures (which
//! are recovered locally and never propagate past sample retrieval).

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or slicing a dataset manifest.
///
/// Any of these is fatal to the construction of the client that owns the
/// dataset: the run aborts before round 1 rather than starting with a
/// partial roster.
#[derive(Debug, Error)]
pub enum DataError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        /// Path of the manifest that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The manifest header lacks a required column.
    #[error("manifest {path} is missing required column '{column}'")]
    MissingColumn {
        /// Path of the manifest.
        path: PathBuf,
        /// Name of the absent column.
        column: &'static str,
    },

    /// A data row has fewer fields than the header promises.
    #[error("manifest {path} has a malformed row at line {line}")]
    MalformedRow {
        /// Path of the manifest.
        path: PathBuf,
        /// 1-based line number of the offending row.
        line: usize,
    },
}

/// Errors raised while decoding one audio sample.
///
/// Decode failures are recovered at sample retrieval by substituting a
/// silent window; they degrade signal quality but never halt training.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The audio payload could not be decoded.
    #[error("failed to decode audio {path}: {reason}")]
    Decode {
        /// Path of the audio file.
        path: PathBuf,
        /// Human-readable decode failure.
        reason: String,
    },
}
