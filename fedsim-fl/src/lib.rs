//! Federated orchestration and aggregation engine
//!
//! This crate is the heart of fedsim: the local trainer each client runs,
//! sample-weighted parameter aggregation, the multi-round coordinator, and
//! cross-client metric reduction.
//!
//! # Protocol
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Coordinator                                                      │
//! │                                                                  │
//! │  per round:                                                      │
//! │    for each client (ascending index):                            │
//! │      chain `local_epochs` x fit(params); updates compound        │
//! │    aggregate [(params, samples)] weighted by sample count        │
//! │    evaluate aggregated params on every client                    │
//! │    reduce {loss, wer, bleu} → round summary                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scheduling is strictly sequential: one client, one batch, one round at a
//! time. Aggregation acts as the synchronization barrier of each round.

pub mod aggregate;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod metrics;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{aggregate, AggregationError};
pub use client::{ClientError, ClientOptions, EvalOutcome, FitOutcome, FlClient};
pub use config::{DataConfig, ExperimentConfig, RunConfig};
pub use coordinator::{Coordinator, FlError, RoundSummary, RunOutcome};
pub use metrics::{reduce_metrics, MetricKey, MetricValue, MetricsRecord};
