//! Common types and utilities for fedsim
//!
//! This crate provides the shared error type, the logging bootstrap, and the
//! core identifiers used across all fedsim crates.

pub mod error;
pub mod logging;
pub mod types;

pub use error::Error;
pub use logging::{init_logging, init_logging_with_filter, LogLevel};
pub use types::ClientId;
