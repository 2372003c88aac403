//! Shared test doubles for this crate's unit tests.

use std::cell::Cell;
use std::path::PathBuf;

use fedsim_common::ClientId;
use fedsim_data::{Batch, GroupPartition, PartitionedDataset, Utterance};
use fedsim_model::{
    BatchEval, DecodeOptions, ModelError, ParamSpec, ParameterLayout, ParameterSet, SpeechModel,
};
use ndarray::{ArrayD, IxDyn};

/// Builds a single-group dataset of `n` synthetic utterances.
pub(crate) fn make_test_dataset(n: usize) -> PartitionedDataset {
    let utterances: Vec<Utterance> = (0..n)
        .map(|i| Utterance {
            group: "spk0".to_string(),
            path: PathBuf::from(format!("clips/{i}.mp3")),
            transcript: format!("sample text number {i}"),
        })
        .collect();
    let partition = GroupPartition::assign(&["spk0".to_string()], ClientId::new(0), 1);
    PartitionedDataset::new(utterances, PathBuf::from("/data"), partition)
}

/// Builds a one-array parameter set holding `values`.
pub(crate) fn params_of(values: &[f32]) -> ParameterSet {
    let layout = ParameterLayout::new(vec![ParamSpec::new("w", vec![values.len()])]);
    let array = ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec())
        .expect("shape matches value count");
    ParameterSet::new(layout, vec![array]).expect("layout matches array")
}

/// Failure script for stubbed batch processing.
#[derive(Debug, Clone)]
pub(crate) enum StubBehavior {
    /// Every call succeeds.
    Succeed,
    /// Every call fails.
    AlwaysFail,
    /// Calls at the given zero-based indices fail.
    FailOnCalls(Vec<usize>),
}

impl StubBehavior {
    fn fails(&self, call: usize) -> bool {
        match self {
            StubBehavior::Succeed => false,
            StubBehavior::AlwaysFail => true,
            StubBehavior::FailOnCalls(calls) => calls.contains(&call),
        }
    }
}

/// Scriptable [`SpeechModel`] double.
///
/// Echoes reference transcripts as its predictions, returns scripted losses
/// indexed by call, and injects failures per [`StubBehavior`].
pub(crate) struct StubModel {
    layout: ParameterLayout,
    arrays: Vec<ArrayD<f32>>,
    train_behavior: StubBehavior,
    eval_behavior: StubBehavior,
    train_losses: Vec<f32>,
    train_increment: f32,
    eval_loss: f32,
    train_calls: usize,
    eval_calls: Cell<usize>,
    seen: Vec<Vec<String>>,
}

impl StubModel {
    pub(crate) fn new(initial: &[f32]) -> Self {
        let layout = ParameterLayout::new(vec![ParamSpec::new("w", vec![initial.len()])]);
        let array = ArrayD::from_shape_vec(IxDyn(&[initial.len()]), initial.to_vec())
            .expect("shape matches value count");
        Self {
            layout,
            arrays: vec![array],
            train_behavior: StubBehavior::Succeed,
            eval_behavior: StubBehavior::Succeed,
            train_losses: vec![1.0],
            train_increment: 0.0,
            eval_loss: 1.0,
            train_calls: 0,
            eval_calls: Cell::new(0),
            seen: Vec::new(),
        }
    }

    pub(crate) fn with_train_losses(mut self, losses: &[f32]) -> Self {
        self.train_losses = losses.to_vec();
        self
    }

    pub(crate) fn with_train_behavior(mut self, behavior: StubBehavior) -> Self {
        self.train_behavior = behavior;
        self
    }

    pub(crate) fn with_eval_behavior(mut self, behavior: StubBehavior) -> Self {
        self.eval_behavior = behavior;
        self
    }

    pub(crate) fn with_eval_loss(mut self, loss: f32) -> Self {
        self.eval_loss = loss;
        self
    }

    /// Each successful training batch adds this value to every parameter,
    /// making local-epoch chaining observable.
    pub(crate) fn with_train_increment(mut self, increment: f32) -> Self {
        self.train_increment = increment;
        self
    }

    pub(crate) fn seen_batches(&self) -> Vec<Vec<String>> {
        self.seen.clone()
    }
}

impl SpeechModel for StubModel {
    fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    fn export_parameters(&self) -> ParameterSet {
        ParameterSet::new(self.layout.clone(), self.arrays.clone())
            .expect("stub arrays match their layout")
    }

    fn load_parameters(&mut self, parameters: &ParameterSet) -> Result<(), ModelError> {
        self.layout.ensure_matches(parameters.layout())?;
        self.arrays = parameters.arrays().to_vec();
        Ok(())
    }

    fn train_batch(&mut self, batch: &Batch) -> Result<f32, ModelError> {
        let call = self.train_calls;
        self.train_calls += 1;
        self.seen.push(batch.transcripts.clone());
        if self.train_behavior.fails(call) {
            return Err(ModelError::Inference {
                reason: "injected training failure".to_string(),
            });
        }
        if self.train_increment != 0.0 {
            let increment = self.train_increment;
            for array in &mut self.arrays {
                array.mapv_inplace(|x| x + increment);
            }
        }
        Ok(*self
            .train_losses
            .get(call)
            .or_else(|| self.train_losses.last())
            .unwrap_or(&1.0))
    }

    fn eval_batch(&self, batch: &Batch, _options: &DecodeOptions) -> Result<BatchEval, ModelError> {
        let call = self.eval_calls.get();
        self.eval_calls.set(call + 1);
        if self.eval_behavior.fails(call) {
            return Err(ModelError::Inference {
                reason: "injected evaluation failure".to_string(),
            });
        }
        Ok(BatchEval {
            loss: self.eval_loss,
            transcripts: batch.transcripts.clone(),
        })
    }
}
