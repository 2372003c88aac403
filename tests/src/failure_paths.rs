//! Failure-path scenarios: structural failures halt the run, per-batch
//! failures only degrade it.

use std::path::PathBuf;

use fedsim_common::ClientId;
use fedsim_data::{DataError, GroupPartition, Manifest, PartitionedDataset, SilenceDecoder, Utterance};
use fedsim_fl::{ClientOptions, Coordinator, FlClient, RunConfig};
use fedsim_model::{ParamSpec, ParameterLayout, ParameterSet};
use ndarray::{ArrayD, IxDyn};
use tempfile::TempDir;

use crate::mock_model::{MockBehavior, MockSpeechModel};
use crate::test_utils::init_test_logging;

fn params_of(values: &[f32]) -> ParameterSet {
    let layout = ParameterLayout::new(vec![ParamSpec::new("w", vec![values.len()])]);
    let array = ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.to_vec())
        .expect("shape matches value count");
    ParameterSet::new(layout, vec![array]).expect("layout matches array")
}

fn make_dataset(n: usize) -> PartitionedDataset {
    let utterances: Vec<Utterance> = (0..n)
        .map(|i| Utterance {
            group: "spk0".to_string(),
            path: PathBuf::from(format!("clips/{i}.mp3")),
            transcript: format!("guten tag nummer {i}"),
        })
        .collect();
    let partition = GroupPartition::assign(&["spk0".to_string()], ClientId::new(0), 1);
    PartitionedDataset::new(utterances, PathBuf::from("/data"), partition)
}

fn make_client(model: MockSpeechModel) -> FlClient<MockSpeechModel, SilenceDecoder> {
    FlClient::new(
        ClientId::new(0),
        model,
        make_dataset(4),
        make_dataset(4),
        SilenceDecoder,
        ClientOptions {
            batch_size: 2,
            seed: 1,
            ..ClientOptions::default()
        },
    )
}

fn single_client_config() -> RunConfig {
    RunConfig {
        num_clients: 1,
        num_global_rounds: 1,
        local_epochs: 1,
        batch_size: 2,
        ..RunConfig::default()
    }
}

#[test]
fn test_missing_manifest_aborts_client_construction() {
    init_test_logging();

    let dir = TempDir::new().unwrap();
    let err = Manifest::load(&dir.path().join("absent.tsv")).unwrap_err();
    assert!(matches!(err, DataError::ManifestRead { .. }));
}

#[test]
fn test_parameter_shape_mismatch_fails_the_run() {
    init_test_logging();

    let clients = vec![make_client(MockSpeechModel::new(&[0.0, 0.0]))];
    // initial snapshot has the wrong shape for the roster's models
    let outcome = Coordinator::new(single_client_config(), clients).run(params_of(&[0.0]));

    assert!(!outcome.success);
    assert!(outcome.message.starts_with("training failed"));
    assert!(outcome.message.contains("parameter"));
    assert!(outcome.rounds.is_empty());
    assert!(outcome.final_parameters.is_none());
}

#[test]
fn test_failing_training_batches_degrade_without_halting() {
    init_test_logging();

    let model = MockSpeechModel::new(&[0.0])
        .with_train_behavior(MockBehavior::FailOnCalls(vec![0]))
        .with_eval_loss(2.5);
    let clients = vec![make_client(model)];
    let outcome = Coordinator::new(single_client_config(), clients).run(params_of(&[0.0]));

    assert!(outcome.success, "batch failures must not halt the round");
    assert_eq!(outcome.rounds.len(), 1);
    assert_eq!(outcome.rounds[0].total_samples, 4);
}

#[test]
fn test_all_eval_batches_failing_completes_with_no_metrics() {
    init_test_logging();

    let model =
        MockSpeechModel::new(&[0.0]).with_eval_behavior(MockBehavior::AlwaysFail);
    let clients = vec![make_client(model)];
    let outcome = Coordinator::new(single_client_config(), clients).run(params_of(&[0.0]));

    assert!(outcome.success, "evaluation degradation is not structural");
    let summary = &outcome.rounds[0];
    assert!(
        summary.averaged.is_empty(),
        "no client produced a numeric value for any key"
    );
    // the per-client record still exists, carrying only failure markers
    assert_eq!(summary.per_client.len(), 1);
    assert!(summary.per_client[0].1.numeric(fedsim_fl::MetricKey::Loss).is_none());
}

#[test]
fn test_zero_sample_aggregation_fails_the_round() {
    init_test_logging();

    // a roster whose only client has an empty training partition
    let client = FlClient::new(
        ClientId::new(0),
        MockSpeechModel::new(&[0.0]),
        make_dataset(0),
        make_dataset(2),
        SilenceDecoder,
        ClientOptions {
            batch_size: 2,
            seed: 1,
            ..ClientOptions::default()
        },
    );
    let outcome = Coordinator::new(single_client_config(), vec![client]).run(params_of(&[0.0]));

    assert!(!outcome.success);
    assert!(outcome.message.contains("total sample count is zero"));
}
