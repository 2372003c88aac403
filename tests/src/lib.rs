//! Integration test framework for fedsim
//!
//! This crate provides test utilities and mock components for integration
//! testing of the federated training engine.
//!
//! # Components
//!
//! - [`mock_model`] - Scriptable speech model for driving the engine
//! - [`test_fixtures`] - Manifest builders and roster helpers
//! - [`test_utils`] - Utility functions for test setup
//!
//! # Test Categories
//!
//! 1. **End-to-end rounds** - Partitioning, aggregation arity, metric
//!    reduction and reproducibility over the full stack
//! 2. **Failure paths** - Structural failures halting the run versus
//!    recoverable degradation

pub mod test_fixtures;
pub mod test_utils;

#[cfg(test)]
mod e2e_round;
#[cfg(test)]
mod failure_paths;

pub use mock_model::{MockBehavior, MockSpeechModel};
pub use test_fixtures::{write_manifest, TestDataset};
pub use test_utils::{init_test_logging, TestResult};
