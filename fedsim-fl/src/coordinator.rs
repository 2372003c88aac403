//! The multi-round federated coordinator.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::time::{Duration, Instant};

use fedsim_common::ClientId;
use fedsim_data::AudioDecoder;
use fedsim_model::{ParameterSet, SpeechModel};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::aggregate::{aggregate, AggregationError};
use crate::client::{ClientError, FlClient};
use crate::config::RunConfig;
use crate::metrics::{reduce_metrics, MetricKey, MetricsRecord};

/// Failures that abort the round loop.
#[derive(Debug, Error)]
pub enum FlError {
    /// A client's fit or evaluate call failed structurally.
    #[error("client failure: {0}")]
    Client(#[from] ClientError),

    /// Aggregation failed for the round.
    #[error("aggregation failure: {0}")]
    Aggregation(#[from] AggregationError),
}

/// One round's outcome: the fresh global snapshot plus its console-style
/// summary.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    /// Round number, starting at 1.
    pub round: usize,
    /// The aggregated global parameters this round produced.
    pub global_parameters: ParameterSet,
    /// Per-client evaluation metrics, in client order.
    pub per_client: Vec<(ClientId, MetricsRecord)>,
    /// Metric means over clients with numeric values; keys with no numeric
    /// contributor are absent.
    pub averaged: BTreeMap<MetricKey, f64>,
    /// Total training samples contributed to this round's aggregation.
    pub total_samples: usize,
    /// Wall-clock duration of the round.
    pub duration: Duration,
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}:", self.round)?;
        if self.averaged.is_empty() {
            write!(f, " no usable metrics")?;
        }
        for (key, value) in &self.averaged {
            write!(f, " {key}={value:.4}")?;
        }
        write!(
            f,
            " ({} clients, {} samples, {:.1?})",
            self.per_client.len(),
            self.total_samples,
            self.duration
        )
    }
}

/// Final result of a federated run.
///
/// A run never raises past its own boundary: every failure is converted
/// into `success = false` with the error rendered into `message`.
#[derive(Debug)]
pub struct RunOutcome {
    /// Whether all rounds completed.
    pub success: bool,
    /// Human-readable completion or failure message.
    pub message: String,
    /// Summaries of the rounds that completed.
    pub rounds: Vec<RoundSummary>,
    /// The final aggregated parameters, when the run succeeded.
    pub final_parameters: Option<ParameterSet>,
}

/// Drives the synchronous federated round loop over a fixed client roster.
pub struct Coordinator<M, D> {
    config: RunConfig,
    clients: Vec<FlClient<M, D>>,
    history: Vec<RoundSummary>,
}

impl<M: SpeechModel, D: AudioDecoder> Coordinator<M, D> {
    /// Creates a coordinator over `clients`.
    ///
    /// The roster is fixed from here on: clients are iterated in ascending
    /// index order every round, and every client participates. A
    /// `fraction_fit` below 1.0 is accepted but honored as full
    /// participation.
    pub fn new(config: RunConfig, clients: Vec<FlClient<M, D>>) -> Self {
        if config.fraction_fit < 1.0 {
            warn!(
                fraction_fit = config.fraction_fit,
                "partial participation is not implemented; all clients participate"
            );
        }
        Self {
            config,
            clients,
            history: Vec::new(),
        }
    }

    /// Returns the number of clients in the roster.
    pub fn num_clients(&self) -> usize {
        self.clients.len()
    }

    /// Runs the full experiment, starting from `initial` global parameters.
    ///
    /// This is the single catch point of the engine: any error raised
    /// anywhere in the loop is logged with full detail and converted into a
    /// failed [`RunOutcome`]; completed round summaries are preserved either
    /// way.
    pub fn run(mut self, initial: ParameterSet) -> RunOutcome {
        let started = Instant::now();
        info!(
            clients = self.clients.len(),
            rounds = self.config.num_global_rounds,
            local_epochs = self.config.local_epochs,
            "starting federated training"
        );

        match self.execute(initial) {
            Ok(parameters) => {
                info!(elapsed = ?started.elapsed(), "federated training completed");
                RunOutcome {
                    success: true,
                    message: "training completed successfully".to_string(),
                    rounds: mem::take(&mut self.history),
                    final_parameters: Some(parameters),
                }
            }
            Err(e) => {
                error!(error = %e, "federated training failed");
                RunOutcome {
                    success: false,
                    message: format!("training failed: {e}"),
                    rounds: mem::take(&mut self.history),
                    final_parameters: None,
                }
            }
        }
    }

    fn execute(&mut self, initial: ParameterSet) -> Result<ParameterSet, FlError> {
        let mut parameters = initial;

        for round in 1..=self.config.num_global_rounds {
            let round_started = Instant::now();
            info!(round, total = self.config.num_global_rounds, "global round");

            // Local training: each client chains its local epochs before
            // anything is aggregated, so updates compound locally first.
            let mut contributions = Vec::with_capacity(self.clients.len());
            for client in &mut self.clients {
                let mut local = parameters.clone();
                for epoch in 1..=self.config.local_epochs {
                    let outcome = client.fit(&local)?;
                    info!(
                        client = %client.id(),
                        epoch,
                        local_epochs = self.config.local_epochs,
                        loss = outcome.metrics.numeric(MetricKey::Loss),
                        failed_batches = outcome.batches_failed,
                        "local epoch finished"
                    );
                    local = outcome.parameters;
                }
                contributions.push((local, client.train_len()));
            }

            // Aggregation is the synchronization barrier of the round.
            let total_samples = contributions.iter().map(|(_, n)| n).sum();
            parameters = aggregate(&contributions, total_samples)?;

            // Evaluate the fresh global snapshot on every client, as-is.
            let mut per_client = Vec::with_capacity(self.clients.len());
            for client in &mut self.clients {
                let outcome = client.evaluate(&parameters)?;
                info!(
                    client = %client.id(),
                    metrics = %outcome.metrics,
                    "evaluation complete"
                );
                per_client.push((client.id(), outcome.metrics));
            }

            let averaged = reduce_metrics(&per_client);
            let summary = RoundSummary {
                round,
                global_parameters: parameters.clone(),
                per_client,
                averaged,
                total_samples,
                duration: round_started.elapsed(),
            };
            info!(summary = %summary, "round summary");
            self.history.push(summary);
        }

        Ok(parameters)
    }
}
