//! Mini-batch planning and the batch value type.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// One owned mini-batch of model-ready samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Fixed-window audio, one waveform per sample.
    pub audio: Vec<Vec<f32>>,
    /// Reference transcripts, aligned with `audio`.
    pub transcripts: Vec<String>,
    /// Resolved source paths, aligned with `audio`.
    pub paths: Vec<PathBuf>,
}

impl Batch {
    /// Returns the number of samples in the batch.
    pub fn len(&self) -> usize {
        self.audio.len()
    }

    /// Returns true if the batch holds no samples.
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Plans mini-batch index chunks over a dataset of `len` samples.
///
/// With an RNG the index permutation is shuffled first (training); without
/// one the dataset order is kept (evaluation). Shuffling consumes only the
/// injected random source; there is no process-global RNG involved.
///
/// The final chunk may be smaller than `batch_size`.
///
/// # Panics
/// Panics if `batch_size` is zero.
pub fn batch_indices(len: usize, batch_size: usize, rng: Option<&mut StdRng>) -> Vec<Vec<usize>> {
    assert!(batch_size > 0, "batch size must be positive");

    let mut indices: Vec<usize> = (0..len).collect();
    if let Some(rng) = rng {
        indices.shuffle(rng);
    }
    indices.chunks(batch_size).map(<[usize]>::to_vec).collect()
}
