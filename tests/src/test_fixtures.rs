//! Test fixtures: manifest builders and roster helpers.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use fedsim_common::ClientId;
use fedsim_data::{Manifest, SimulatedDecoder};
use fedsim_fl::{ClientOptions, FlClient, RunConfig};
use fedsim_model::{LinearAsrModel, ModelOptions, OptimizerOptions};

/// Writes a TSV manifest with `rows` of (group, transcript) pairs.
///
/// Audio paths are generated per row; they do not need to exist, since
/// integration runs use the simulated decoder.
pub fn write_manifest(dir: &Path, name: &str, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let mut file = fs::File::create(&path).expect("create manifest");
    writeln!(file, "client_id\tpath\tsentence").expect("write header");
    for (index, (group, transcript)) in rows.iter().enumerate() {
        writeln!(file, "{group}\tclips/{group}_{index}.mp3\t{transcript}").expect("write row");
    }
    path
}

/// A train/test manifest pair on a temporary directory.
pub struct TestDataset {
    /// Directory keeping the manifests alive.
    pub dir: TempDir,
    /// Path of the training manifest.
    pub train: PathBuf,
    /// Path of the test manifest.
    pub test: PathBuf,
}

impl TestDataset {
    /// Builds manifests over `groups`, with `train_rows` training rows and
    /// one test row per group.
    pub fn with_groups(groups: &[&str], train_rows: usize) -> Self {
        let dir = TempDir::new().expect("create tempdir");

        let mut train_entries = Vec::new();
        for group in groups {
            for _ in 0..train_rows {
                train_entries.push((*group, "guten morgen zusammen"));
            }
        }
        let test_entries: Vec<(&str, &str)> = groups
            .iter()
            .map(|group| (*group, "wie geht es dir heute"))
            .collect();

        let train = write_manifest(dir.path(), "train.tsv", &train_entries);
        let test = write_manifest(dir.path(), "test.tsv", &test_entries);
        Self { dir, train, test }
    }

    /// Builds the full client roster over these manifests, mirroring the
    /// way the `fedsim` binary assembles a run.
    pub fn build_roster(
        &self,
        config: &RunConfig,
    ) -> Vec<FlClient<LinearAsrModel, SimulatedDecoder>> {
        let train_manifest = Manifest::load(&self.train).expect("load train manifest");
        let test_manifest = Manifest::load(&self.test).expect("load test manifest");

        (0..config.num_clients)
            .map(|index| {
                let id = ClientId::new(index);
                let mut trainset = train_manifest.partition(id, config.num_clients);
                let mut testset = test_manifest.partition(id, config.num_clients);
                if let Some(max_samples) = config.max_samples {
                    trainset.truncate(max_samples);
                    testset.truncate(max_samples);
                }

                let seed = config.client_seed(index);
                let model =
                    LinearAsrModel::new(&ModelOptions::default(), OptimizerOptions::default(), seed);
                FlClient::new(
                    id,
                    model,
                    trainset,
                    testset,
                    SimulatedDecoder::new(config.seed),
                    ClientOptions {
                        batch_size: config.batch_size,
                        seed,
                        ..ClientOptions::default()
                    },
                )
            })
            .collect()
    }
}
