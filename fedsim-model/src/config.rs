//! Model, decoding and optimizer options.

use serde::{Deserialize, Serialize};

/// Decoding task requested from the speech model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranscribeTask {
    /// Transcribe in the source language (default).
    #[default]
    Transcribe,
    /// Translate into English.
    Translate,
}

impl std::fmt::Display for TranscribeTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscribeTask::Transcribe => write!(f, "transcribe"),
            TranscribeTask::Translate => write!(f, "translate"),
        }
    }
}

/// Options for bounded generation during evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Maximum number of decoded symbols.
    pub max_length: usize,
    /// Beam width for beam-search-style decoding.
    pub beam_width: usize,
    /// Forced decoding language (ISO 639-1).
    pub language: String,
    /// Decoding task.
    pub task: TranscribeTask,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_length: 128,
            beam_width: 5,
            language: "de".to_string(),
            task: TranscribeTask::Transcribe,
        }
    }
}

impl DecodeOptions {
    /// Sets the maximum decoded length.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Sets the beam width.
    pub fn with_beam_width(mut self, beam_width: usize) -> Self {
        self.beam_width = beam_width;
        self
    }

    /// Sets the forced decoding language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Local optimizer hyper-parameters, handed to model implementations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerOptions {
    /// Learning rate.
    pub learning_rate: f32,
    /// First-moment decay.
    pub beta1: f32,
    /// Second-moment decay.
    pub beta2: f32,
    /// Numerical stabilizer.
    pub epsilon: f32,
    /// Decoupled weight decay.
    pub weight_decay: f32,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            learning_rate: 2e-4,
            beta1: 0.9,
            beta2: 0.98,
            epsilon: 1e-9,
            weight_decay: 0.1,
        }
    }
}

impl OptimizerOptions {
    /// Sets the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

/// Size options for the reference model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    /// Width of the hidden projection.
    pub hidden_size: usize,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self { hidden_size: 16 }
    }
}
