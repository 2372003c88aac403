//! Dataset access and partitioning for fedsim
//!
//! This crate owns everything between the on-disk dataset manifest and the
//! batches a local trainer consumes:
//!
//! - parsing the tab-separated utterance manifest,
//! - deterministic assignment of original speaker groups to federated
//!   clients,
//! - fixed-window audio conditioning (pad/truncate to 30 s at 16 kHz),
//! - recovery from undecodable audio by substituting silence,
//! - mini-batch index planning with an injected random source.

pub mod audio;
pub mod batch;
pub mod dataset;
pub mod error;
pub mod manifest;
pub mod partition;

pub use audio::{
    fit_to_window, AudioDecoder, SilenceDecoder, SimulatedDecoder, SAMPLE_RATE, WINDOW_SAMPLES,
    WINDOW_SECS,
};
pub use batch::{batch_indices, Batch};
pub use dataset::{PartitionedDataset, Sample};
pub use error::{AudioError, DataError};
pub use manifest::{Manifest, Utterance};
pub use partition::{group_slice, GroupPartition};
