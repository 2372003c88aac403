//! The local trainer: one model replica bound to one data partition.

use fedsim_common::ClientId;
use fedsim_data::{batch_indices, AudioDecoder, PartitionedDataset};
use fedsim_model::{
    BleuScore, DecodeOptions, ModelError, ParamError, ParameterSet, SpeechModel, TranscriptScorer,
    WordErrorRate,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::metrics::{MetricKey, MetricsRecord};

/// Training progress is logged every this many successful batches.
const PROGRESS_INTERVAL: u32 = 5;

/// Failures that abort a single `fit` or `evaluate` call.
///
/// Per-batch failures are not represented here; they are recovered inside
/// the call by skipping the batch.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The strict parameter loader rejected the snapshot.
    #[error("parameter load rejected: {0}")]
    ParameterShape(#[from] ParamError),

    /// The model failed outside of batch processing.
    #[error("model failure: {0}")]
    Model(ModelError),
}

/// Per-client knobs, fixed at construction.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Mini-batch size for both training and evaluation.
    pub batch_size: usize,
    /// Decoding options used during evaluation.
    pub decode: DecodeOptions,
    /// Seed of the client's private random source.
    pub seed: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            batch_size: 16,
            decode: DecodeOptions::default(),
            seed: 0,
        }
    }
}

/// Result of one local training pass.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Updated parameter snapshot.
    pub parameters: ParameterSet,
    /// Total size of the training partition, including samples in skipped
    /// batches.
    pub num_samples: usize,
    /// Training metrics (mean loss over successful batches).
    pub metrics: MetricsRecord,
    /// Number of batches processed successfully.
    pub batches_ok: u32,
    /// Number of batches skipped after a processing failure.
    pub batches_failed: u32,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// Mean loss over successful batches; `+inf` when none succeeded.
    pub loss: f64,
    /// Total size of the test partition.
    pub num_samples: usize,
    /// Evaluation metrics; all entries are failure markers when no batch
    /// succeeded.
    pub metrics: MetricsRecord,
    /// Number of batches processed successfully.
    pub batches_ok: u32,
    /// Number of batches skipped after a processing failure.
    pub batches_failed: u32,
}

/// One federated client: a model replica plus its assigned partitions.
///
/// Created once before round 1 with a fixed partition; lives for the whole
/// run and is never re-partitioned. The client owns its model and random
/// source exclusively; nothing is shared across clients.
pub struct FlClient<M, D> {
    id: ClientId,
    model: M,
    trainset: PartitionedDataset,
    testset: PartitionedDataset,
    decoder: D,
    scorers: Vec<(MetricKey, Box<dyn TranscriptScorer>)>,
    options: ClientOptions,
    rng: StdRng,
}

impl<M: SpeechModel, D: AudioDecoder> FlClient<M, D> {
    /// Creates a client with the default scorer set (WER and BLEU).
    pub fn new(
        id: ClientId,
        model: M,
        trainset: PartitionedDataset,
        testset: PartitionedDataset,
        decoder: D,
        options: ClientOptions,
    ) -> Self {
        let rng = StdRng::seed_from_u64(options.seed);
        Self {
            id,
            model,
            trainset,
            testset,
            decoder,
            scorers: vec![
                (MetricKey::Wer, Box::new(WordErrorRate)),
                (MetricKey::Bleu, Box::new(BleuScore::new())),
            ],
            options,
            rng,
        }
    }

    /// Replaces the transcript scorers.
    pub fn with_scorers(mut self, scorers: Vec<(MetricKey, Box<dyn TranscriptScorer>)>) -> Self {
        self.scorers = scorers;
        self
    }

    /// Returns the client identifier.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the size of the training partition.
    pub fn train_len(&self) -> usize {
        self.trainset.len()
    }

    /// Returns the size of the test partition.
    pub fn test_len(&self) -> usize {
        self.testset.len()
    }

    fn load(&mut self, parameters: &ParameterSet) -> Result<(), ClientError> {
        self.model.load_parameters(parameters).map_err(|e| match e {
            ModelError::Params(p) => ClientError::ParameterShape(p),
            other => ClientError::Model(other),
        })
    }

    /// Runs one local epoch: a full pass over the training partition in
    /// shuffled mini-batches.
    ///
    /// A batch that fails to process is logged and skipped; it neither
    /// aborts the epoch nor shrinks the reported sample count. The returned
    /// mean loss covers successful batches only, with a
    /// `total / max(successes, 1)` denominator so an epoch where every
    /// batch failed still yields a well-defined value.
    ///
    /// # Errors
    /// Returns [`ClientError::ParameterShape`] when `parameters` disagrees
    /// with the model's manifest; nothing has been trained in that case.
    pub fn fit(&mut self, parameters: &ParameterSet) -> Result<FitOutcome, ClientError> {
        self.load(parameters)?;

        let plan = batch_indices(
            self.trainset.len(),
            self.options.batch_size,
            Some(&mut self.rng),
        );
        let mut total_loss = 0.0f64;
        let mut batches_ok = 0u32;
        let mut batches_failed = 0u32;

        for indices in &plan {
            let batch = self.trainset.batch(indices, &self.decoder);
            match self.model.train_batch(&batch) {
                Ok(loss) => {
                    total_loss += f64::from(loss);
                    batches_ok += 1;
                    if batches_ok % PROGRESS_INTERVAL == 0 {
                        debug!(
                            client = %self.id,
                            batches = batches_ok,
                            loss,
                            "training progress"
                        );
                    }
                }
                Err(e) => {
                    batches_failed += 1;
                    warn!(client = %self.id, error = %e, "skipping failed training batch");
                }
            }
        }

        let avg_loss = total_loss / f64::from(batches_ok.max(1));
        let mut metrics = MetricsRecord::new();
        metrics.record_number(MetricKey::Loss, avg_loss);

        Ok(FitOutcome {
            parameters: self.model.export_parameters(),
            num_samples: self.trainset.len(),
            metrics,
            batches_ok,
            batches_failed,
        })
    }

    /// Evaluates a parameter snapshot on the test partition, in fixed order.
    ///
    /// Per batch, the model produces a loss and bounded-length decoded
    /// transcripts; failures are skipped exactly as in [`FlClient::fit`].
    /// When no batch succeeds the outcome carries `loss = +inf` and a
    /// metrics record made solely of failure markers; callers must treat
    /// it as "no usable signal", not as a numeric zero.
    ///
    /// # Errors
    /// Returns [`ClientError::ParameterShape`] when `parameters` disagrees
    /// with the model's manifest.
    pub fn evaluate(&mut self, parameters: &ParameterSet) -> Result<EvalOutcome, ClientError> {
        self.load(parameters)?;

        let plan = batch_indices(self.testset.len(), self.options.batch_size, None);
        let mut total_loss = 0.0f64;
        let mut batches_ok = 0u32;
        let mut batches_failed = 0u32;
        let mut predictions: Vec<String> = Vec::new();
        let mut references: Vec<String> = Vec::new();

        for indices in &plan {
            let batch = self.testset.batch(indices, &self.decoder);
            match self.model.eval_batch(&batch, &self.options.decode) {
                Ok(eval) => {
                    total_loss += f64::from(eval.loss);
                    batches_ok += 1;
                    predictions.extend(eval.transcripts);
                    references.extend_from_slice(&batch.transcripts);
                }
                Err(e) => {
                    batches_failed += 1;
                    warn!(client = %self.id, error = %e, "skipping failed evaluation batch");
                }
            }
        }

        if batches_ok == 0 {
            let reason = "no successful evaluation batches";
            warn!(client = %self.id, "{reason}");
            return Ok(EvalOutcome {
                loss: f64::INFINITY,
                num_samples: self.testset.len(),
                metrics: MetricsRecord::all_failed(reason),
                batches_ok,
                batches_failed,
            });
        }

        let loss = total_loss / f64::from(batches_ok);
        let mut metrics = MetricsRecord::new();
        metrics.record_number(MetricKey::Loss, loss);
        for (key, scorer) in &self.scorers {
            match scorer.score(&predictions, &references) {
                Some(value) => metrics.record_number(*key, value),
                None => {
                    metrics.record_failure(*key, format!("{} unavailable", scorer.name()));
                }
            }
        }

        Ok(EvalOutcome {
            loss,
            num_samples: self.testset.len(),
            metrics,
            batches_ok,
            batches_failed,
        })
    }
}


#[cfg(test)]
impl FlClient<crate::testing::StubModel, fedsim_data::SilenceDecoder> {
    fn model_seen_batches(&self) -> Vec<Vec<String>> {
        self.model.seen_batches()
    }
}
