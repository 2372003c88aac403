//! Per-client dataset views and sample retrieval.

use std::path::PathBuf;

use tracing::warn;

use crate::audio::{fit_to_window, AudioDecoder, WINDOW_SAMPLES};
use crate::batch::Batch;
use crate::manifest::Utterance;
use crate::partition::GroupPartition;

/// One model-ready sample: fixed-window audio, reference transcript, and
/// the resolved source path.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Mono waveform of exactly [`WINDOW_SAMPLES`] samples.
    pub audio: Vec<f32>,
    /// Reference transcript.
    pub transcript: String,
    /// Resolved audio path.
    pub path: PathBuf,
}

/// The immutable slice of a dataset assigned to one federated client.
///
/// Created once at startup from a [`crate::Manifest`]; a client is never
/// re-partitioned.
#[derive(Debug, Clone)]
pub struct PartitionedDataset {
    utterances: Vec<Utterance>,
    base_dir: PathBuf,
    partition: GroupPartition,
}

impl PartitionedDataset {
    /// Creates a dataset view over the given rows.
    pub fn new(utterances: Vec<Utterance>, base_dir: PathBuf, partition: GroupPartition) -> Self {
        Self {
            utterances,
            base_dir,
            partition,
        }
    }

    /// Returns the group assignment backing this view.
    pub fn partition(&self) -> &GroupPartition {
        &self.partition
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    /// Returns true if the view holds no samples.
    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    /// Returns the utterances in manifest order.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// Keeps only the first `max_samples` rows.
    ///
    /// Applied after group filtering, never before: truncation bounds the
    /// per-client workload without changing the group assignment.
    pub fn truncate(&mut self, max_samples: usize) {
        self.utterances.truncate(max_samples);
    }

    /// Retrieves the sample at `index`, decoding its audio.
    ///
    /// A decode failure is logged and recovered by substituting a silent
    /// window; it never propagates past this call.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn sample<D: AudioDecoder>(&self, index: usize, decoder: &D) -> Sample {
        let utterance = &self.utterances[index];
        let path = self.base_dir.join(&utterance.path);
        let audio = match decoder.decode(&path) {
            Ok(wave) => fit_to_window(wave),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "audio decode failed, substituting silence");
                vec![0.0; WINDOW_SAMPLES]
            }
        };
        Sample {
            audio,
            transcript: utterance.transcript.clone(),
            path,
        }
    }

    /// Materializes one mini-batch from the given sample indices.
    ///
    /// Audio buffers are owned by the returned batch and dropped with it;
    /// nothing is cached between batches.
    pub fn batch<D: AudioDecoder>(&self, indices: &[usize], decoder: &D) -> Batch {
        let mut audio = Vec::with_capacity(indices.len());
        let mut transcripts = Vec::with_capacity(indices.len());
        let mut paths = Vec::with_capacity(indices.len());
        for &index in indices {
            let sample = self.sample(index, decoder);
            audio.push(sample.audio);
            transcripts.push(sample.transcript);
            paths.push(sample.path);
        }
        Batch {
            audio,
            transcripts,
            paths,
        }
    }
}
