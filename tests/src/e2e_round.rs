//! End-to-end round scenarios over the full stack.

use fedsim_fl::{Coordinator, MetricKey, RunConfig};
use fedsim_model::{LinearAsrModel, ModelOptions, OptimizerOptions, SpeechModel};

use crate::test_fixtures::TestDataset;
use crate::test_utils::init_test_logging;

fn small_run(num_clients: usize, rounds: usize, local_epochs: usize) -> RunConfig {
    RunConfig {
        num_clients,
        num_global_rounds: rounds,
        local_epochs,
        batch_size: 2,
        seed: 42,
        ..RunConfig::default()
    }
}

fn initial_parameters(seed: u64) -> fedsim_model::ParameterSet {
    LinearAsrModel::new(&ModelOptions::default(), OptimizerOptions::default(), seed)
        .export_parameters()
}

#[test]
fn test_two_clients_four_groups_one_round() {
    init_test_logging();

    let dataset = TestDataset::with_groups(&["spk0", "spk1", "spk2", "spk3"], 2);
    let config = small_run(2, 1, 1);
    let clients = dataset.build_roster(&config);

    // each client receives exactly 2 of the 4 groups
    for client in &clients {
        assert_eq!(client.train_len(), 4, "2 groups x 2 rows");
        assert_eq!(client.test_len(), 2, "2 groups x 1 row");
    }

    let outcome = Coordinator::new(config, clients).run(initial_parameters(42));

    assert!(outcome.success, "run failed: {}", outcome.message);
    assert_eq!(outcome.rounds.len(), 1, "exactly one aggregation round");
    let summary = &outcome.rounds[0];
    assert_eq!(summary.per_client.len(), 2, "both contributions collected");
    assert_eq!(summary.total_samples, 8);
    assert!(summary.averaged.contains_key(&MetricKey::Loss));
    assert!(summary.averaged.contains_key(&MetricKey::Wer));
    assert!(summary.averaged.contains_key(&MetricKey::Bleu));
    assert!(outcome.final_parameters.is_some());
}

#[test]
fn test_partitions_are_disjoint() {
    init_test_logging();

    let dataset = TestDataset::with_groups(&["spk0", "spk1", "spk2", "spk3"], 1);
    let config = small_run(2, 1, 1);
    let clients = dataset.build_roster(&config);

    let mut seen = std::collections::HashSet::new();
    for client in &clients {
        // every test row belongs to exactly one client
        assert_eq!(client.test_len(), 2);
    }
    // disjointness over the training rows: 4 groups x 1 row, split 2/2
    let total: usize = clients.iter().map(|c| c.train_len()).sum();
    assert_eq!(total, 4);
    for client in &clients {
        assert!(seen.insert(client.id()), "duplicate client id");
    }
}

#[test]
fn test_remainder_group_is_dropped() {
    init_test_logging();

    // 5 groups over 2 clients: 2 + 2 assigned, the last sorted group dropped
    let dataset = TestDataset::with_groups(&["spk0", "spk1", "spk2", "spk3", "spk4"], 1);
    let config = small_run(2, 1, 1);
    let clients = dataset.build_roster(&config);

    let total: usize = clients.iter().map(|c| c.train_len()).sum();
    assert_eq!(total, 4, "the remainder group contributes to no client");

    let outcome = Coordinator::new(config, clients).run(initial_parameters(42));
    assert!(outcome.success);
    assert_eq!(outcome.rounds[0].total_samples, 4);
}

#[test]
fn test_multi_round_carries_parameters_forward() {
    init_test_logging();

    let dataset = TestDataset::with_groups(&["spk0", "spk1"], 2);
    let config = small_run(2, 2, 2);
    let clients = dataset.build_roster(&config);

    let initial = initial_parameters(42);
    let outcome = Coordinator::new(config, clients).run(initial.clone());

    assert!(outcome.success, "run failed: {}", outcome.message);
    assert_eq!(outcome.rounds.len(), 2);
    let parameters = outcome.final_parameters.expect("final parameters");
    assert_eq!(parameters.layout(), initial.layout());
    assert_ne!(parameters, initial, "training moved the global model");
}

#[test]
fn test_same_seed_reproduces_the_run() {
    init_test_logging();

    let dataset = TestDataset::with_groups(&["spk0", "spk1", "spk2", "spk3"], 2);
    let config = small_run(2, 2, 1);

    let first = Coordinator::new(config.clone(), dataset.build_roster(&config))
        .run(initial_parameters(42));
    let second = Coordinator::new(config.clone(), dataset.build_roster(&config))
        .run(initial_parameters(42));

    assert!(first.success && second.success);
    assert_eq!(first.final_parameters, second.final_parameters);
    assert_eq!(
        first.rounds[1].averaged, second.rounds[1].averaged,
        "metric reduction is reproducible"
    );
}
