//! Fixed-window audio conditioning and the decoder seam.
//!
//! Actual audio decoding (codecs, resampling, feature extraction) is an
//! external collaborator behind [`AudioDecoder`]; this module only enforces
//! the window invariant every downstream consumer relies on: exactly 30
//! seconds at 16 kHz, zero-padded on the right or truncated to the start of
//! the window.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AudioError;

/// Expected sample rate of decoded audio, in Hz.
pub const SAMPLE_RATE: usize = 16_000;

/// Length of the fixed audio window, in seconds.
pub const WINDOW_SECS: usize = 30;

/// Length of the fixed audio window, in samples.
pub const WINDOW_SAMPLES: usize = SAMPLE_RATE * WINDOW_SECS;

/// Conditions a decoded waveform to exactly [`WINDOW_SAMPLES`] samples.
///
/// Shorter clips are zero-padded on the right; longer clips keep the first
/// [`WINDOW_SAMPLES`] samples.
pub fn fit_to_window(mut samples: Vec<f32>) -> Vec<f32> {
    if samples.len() < WINDOW_SAMPLES {
        samples.resize(WINDOW_SAMPLES, 0.0);
    } else {
        samples.truncate(WINDOW_SAMPLES);
    }
    samples
}

/// Decodes an audio file into a mono 16 kHz waveform.
///
/// Implementations return the raw decoded waveform; window conditioning is
/// applied by the dataset at sample retrieval.
pub trait AudioDecoder {
    /// Decodes the file at `path`.
    ///
    /// # Errors
    /// Returns [`AudioError::Decode`] when the payload cannot be decoded.
    fn decode(&self, path: &Path) -> Result<Vec<f32>, AudioError>;
}

/// Decoder that yields a silent window for every path.
///
/// Useful as a neutral stand-in when no audio material is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilenceDecoder;

impl AudioDecoder for SilenceDecoder {
    fn decode(&self, _path: &Path) -> Result<Vec<f32>, AudioError> {
        Ok(vec![0.0; WINDOW_SAMPLES])
    }
}

/// Decoder that synthesizes a deterministic waveform from the path.
///
/// Every path maps to a stable pseudo-random clip whose length varies from
/// one second up to beyond the window, so padding and truncation are both
/// exercised. Two runs with the same seed observe identical audio.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedDecoder {
    seed: u64,
}

impl SimulatedDecoder {
    /// Creates a decoder whose output is keyed by `seed` and the path.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl AudioDecoder for SimulatedDecoder {
    fn decode(&self, path: &Path) -> Result<Vec<f32>, AudioError> {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(self.seed ^ hasher.finish());

        let len = rng.gen_range(SAMPLE_RATE..=SAMPLE_RATE * 40);
        Ok((0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
    }
}
