//! The seam behind which the speech model lives.

use fedsim_data::Batch;

use crate::config::DecodeOptions;
use crate::error::ModelError;
use crate::params::{ParameterLayout, ParameterSet};

/// Result of evaluating one batch: loss plus decoded transcripts.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEval {
    /// Mean loss over the batch.
    pub loss: f32,
    /// Decoded transcripts, one per sample.
    pub transcripts: Vec<String>,
}

/// A local speech model replica.
///
/// The federated core drives implementations exclusively through this trait:
/// parameters in, parameters out, one batch at a time. Model internals
/// (feature extraction, tokenization, the loss formula) stay behind the
/// seam.
pub trait SpeechModel {
    /// Returns the model's parameter manifest.
    fn layout(&self) -> &ParameterLayout;

    /// Exports the current trainable state as a parameter snapshot.
    fn export_parameters(&self) -> ParameterSet;

    /// Overwrites the trainable state with `parameters`.
    ///
    /// Loading is strict: the snapshot's manifest must be positionally
    /// identical to [`SpeechModel::layout`]. There is no partial load.
    ///
    /// # Errors
    /// Returns [`ModelError::Params`] on any manifest disagreement.
    fn load_parameters(&mut self, parameters: &ParameterSet) -> Result<(), ModelError>;

    /// Runs one forward/backward/optimize step and returns the batch loss.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the batch cannot be processed; callers
    /// treat this as a skippable per-batch failure.
    fn train_batch(&mut self, batch: &Batch) -> Result<f32, ModelError>;

    /// Computes the batch loss and bounded-length decoded transcripts.
    ///
    /// # Errors
    /// Returns [`ModelError`] when the batch cannot be processed; callers
    /// treat this as a skippable per-batch failure.
    fn eval_batch(&self, batch: &Batch, options: &DecodeOptions) -> Result<BatchEval, ModelError>;
}
