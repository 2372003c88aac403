//! Run and experiment configuration.

use std::fs;
use std::path::{Path, PathBuf};

use fedsim_common::Error;
use fedsim_model::{DecodeOptions, ModelOptions, OptimizerOptions};
use serde::{Deserialize, Serialize};

/// Parameters of the federated round loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of federated clients.
    pub num_clients: usize,
    /// Number of global aggregation rounds.
    pub num_global_rounds: usize,
    /// Local epochs each client chains before aggregation.
    pub local_epochs: usize,
    /// Fraction of clients participating per round. Accepted for interface
    /// compatibility; participation is always full.
    pub fraction_fit: f64,
    /// Mini-batch size.
    pub batch_size: usize,
    /// Optional cap on samples per client, applied after group filtering.
    pub max_samples: Option<usize>,
    /// Seed of the run's random source; client sources derive from it.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_clients: 10,
            num_global_rounds: 20,
            local_epochs: 3,
            fraction_fit: 1.0,
            batch_size: 16,
            max_samples: None,
            seed: 42,
        }
    }
}

impl RunConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_clients < 1 {
            return Err(Error::Config("num_clients must be at least 1".to_string()));
        }
        if self.num_global_rounds < 1 {
            return Err(Error::Config(
                "num_global_rounds must be at least 1".to_string(),
            ));
        }
        if self.local_epochs < 1 {
            return Err(Error::Config("local_epochs must be at least 1".to_string()));
        }
        if !(self.fraction_fit > 0.0 && self.fraction_fit <= 1.0) {
            return Err(Error::Config(
                "fraction_fit must be within (0, 1]".to_string(),
            ));
        }
        if self.batch_size < 1 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Derives the seed of one client's private random source.
    pub fn client_seed(&self, client_index: usize) -> u64 {
        self.seed.wrapping_add(client_index as u64 + 1)
    }
}

/// Dataset manifest locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Training manifest (TSV).
    pub train_manifest: PathBuf,
    /// Test manifest (TSV).
    pub test_manifest: PathBuf,
}

/// Everything a run needs, as loaded from one YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Round-loop parameters.
    #[serde(default)]
    pub run: RunConfig,
    /// Dataset locations.
    pub data: DataConfig,
    /// Reference model size.
    #[serde(default)]
    pub model: ModelOptions,
    /// Local optimizer hyper-parameters.
    #[serde(default)]
    pub optimizer: OptimizerOptions,
    /// Evaluation decoding options.
    #[serde(default)]
    pub decode: DecodeOptions,
}

impl ExperimentConfig {
    /// Loads an experiment configuration from a YAML file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::YamlParse`] when it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}
