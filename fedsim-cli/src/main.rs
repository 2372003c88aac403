//! fedsim CLI tool
//!
//! Runs a federated training experiment described by a YAML configuration:
//! builds the client roster from the dataset manifests, drives the round
//! loop, and reports the final outcome through the exit code.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fedsim_common::{init_logging, ClientId, LogLevel};
use fedsim_data::{Manifest, SimulatedDecoder};
use fedsim_fl::{ClientOptions, Coordinator, ExperimentConfig, FlClient};
use fedsim_model::{LinearAsrModel, SpeechModel};

#[derive(Parser, Debug)]
#[command(name = "fedsim")]
#[command(author, version, about = "Federated speech-model training simulator", long_about = None)]
struct Args {
    /// Path to the experiment configuration (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Override the number of federated clients
    #[arg(long)]
    clients: Option<usize>,

    /// Override the number of global rounds
    #[arg(long)]
    rounds: Option<usize>,

    /// Override the number of local epochs per round
    #[arg(long)]
    local_epochs: Option<usize>,

    /// Override the run seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool> {
    let args = Args::parse();
    init_logging(args.log_level);

    let mut config = ExperimentConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(clients) = args.clients {
        config.run.num_clients = clients;
    }
    if let Some(rounds) = args.rounds {
        config.run.num_global_rounds = rounds;
    }
    if let Some(local_epochs) = args.local_epochs {
        config.run.local_epochs = local_epochs;
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    config.run.validate()?;

    // Everything past configuration is the run itself: failures from here
    // on (an unreadable manifest included) become a failed outcome, never
    // a raw error.
    let outcome = match execute(config) {
        Ok(outcome) => outcome,
        Err(e) => fedsim_fl::RunOutcome {
            success: false,
            message: format!("training failed: {e:#}"),
            rounds: Vec::new(),
            final_parameters: None,
        },
    };

    for summary in &outcome.rounds {
        println!("{summary}");
        for (client, metrics) in &summary.per_client {
            println!("  {client}: {metrics}");
        }
    }
    println!("Training result: {}", outcome.message);

    Ok(outcome.success)
}

fn execute(config: ExperimentConfig) -> Result<fedsim_fl::RunOutcome> {
    // The pretrained central model every client starts from.
    let global_model = LinearAsrModel::new(&config.model, config.optimizer, config.run.seed);
    let initial_parameters = global_model.export_parameters();

    let train_manifest = Manifest::load(&config.data.train_manifest)
        .context("failed to load training manifest")?;
    let test_manifest =
        Manifest::load(&config.data.test_manifest).context("failed to load test manifest")?;

    let mut clients = Vec::with_capacity(config.run.num_clients);
    for index in 0..config.run.num_clients {
        let id = ClientId::new(index);
        let mut trainset = train_manifest.partition(id, config.run.num_clients);
        let mut testset = test_manifest.partition(id, config.run.num_clients);
        if let Some(max_samples) = config.run.max_samples {
            trainset.truncate(max_samples);
            testset.truncate(max_samples);
        }

        let seed = config.run.client_seed(index);
        let model = LinearAsrModel::new(&config.model, config.optimizer, seed);
        let decoder = SimulatedDecoder::new(config.run.seed);
        clients.push(FlClient::new(
            id,
            model,
            trainset,
            testset,
            decoder,
            ClientOptions {
                batch_size: config.run.batch_size,
                decode: config.decode.clone(),
                seed,
            },
        ));
    }
    info!(clients = clients.len(), "client roster ready");

    let coordinator = Coordinator::new(config.run, clients);
    Ok(coordinator.run(initial_parameters))
}
