//! natsel CLI - evolve LLM agent configurations and report the
//! train/test calibration gap.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use natsel_core::RunReport;
use natsel_evaluator::{CancelFlag, Evaluator, FitnessConfig, OpenAiClient, OpenAiConfig};
use natsel_evolution::EngineConfig;
use natsel_runner::{Orchestrator, RunConfig, TracingSink};
use natsel_storage::{JsonFileStore, PopulationStore};
use natsel_tasks::{builtin_catalogue, load_tasks};

#[derive(Parser)]
#[command(name = "natsel")]
#[command(about = "Natural selection over LLM agent genomes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full evolutionary simulation
    Run {
        /// Population size
        #[arg(short, long, default_value = "10")]
        population: usize,
        /// Number of generations
        #[arg(short, long, default_value = "15")]
        generations: u32,
        /// Train tasks drawn per generation
        #[arg(short, long, default_value = "8")]
        batch_size: usize,
        /// Max concurrent model calls
        #[arg(short, long, default_value = "10")]
        concurrency: usize,
        /// Per-trait mutation probability
        #[arg(long, default_value = "0.3")]
        mutation_rate: f64,
        /// Fraction of the population kept for breeding
        #[arg(long, default_value = "0.3")]
        survival_fraction: f64,
        /// Genomes carried over unchanged each generation
        #[arg(long, default_value = "2")]
        elite_count: usize,
        /// Seed for the split, rotation, and all stochastic operators
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Generation failure rate that aborts the run
        #[arg(long, default_value = "0.5")]
        failure_threshold: f64,
        /// Model name
        #[arg(long, env = "MODEL_NAME", default_value = "gpt-4o-mini")]
        model: String,
        /// OpenAI-compatible API base URL
        #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
        base_url: String,
        /// API key (or set the env var)
        #[arg(long, env = "OPENAI_API_KEY")]
        api_key: Option<String>,
        /// Per-call timeout in seconds
        #[arg(long, default_value = "60")]
        timeout_secs: u64,
        /// Custom task catalogue (JSON array); defaults to the built-in bank
        #[arg(long)]
        tasks_file: Option<PathBuf>,
        /// Directory for snapshots and the report
        #[arg(long, default_value = ".natsel")]
        store_dir: PathBuf,
    },
    /// Print the report of a stored run
    Report {
        /// Store directory of the run
        #[arg(long, default_value = ".natsel")]
        store_dir: PathBuf,
    },
    /// List the built-in task catalogue
    Tasks,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            population,
            generations,
            batch_size,
            concurrency,
            mutation_rate,
            survival_fraction,
            elite_count,
            seed,
            failure_threshold,
            model,
            base_url,
            api_key,
            timeout_secs,
            tasks_file,
            store_dir,
        } => {
            let catalogue = match &tasks_file {
                Some(path) => load_tasks(path)?,
                None => builtin_catalogue(),
            };

            let client = OpenAiClient::new(OpenAiConfig {
                base_url,
                api_key,
                model: model.clone(),
                timeout: Duration::from_secs(timeout_secs),
                ..OpenAiConfig::default()
            });

            let config = RunConfig {
                seed,
                engine: EngineConfig {
                    population_size: population,
                    total_generations: generations,
                    survival_fraction,
                    elite_count,
                    mutation_rate,
                },
                batch_size,
                concurrency,
                failure_threshold,
                ..RunConfig::default()
            };

            let store = Arc::new(JsonFileStore::new(&store_dir)?);
            let evaluator = Evaluator::new(Arc::new(client), FitnessConfig::default())?;
            let orchestrator =
                Orchestrator::new(evaluator, store.clone(), Arc::new(TracingSink), config);

            info!(model = %model, tasks = catalogue.len(), seed, "starting evolution");

            let cancel = CancelFlag::new();
            let cancel_on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("cancellation requested; letting in-flight calls drain");
                    cancel_on_signal.cancel();
                }
            });

            let outcome = orchestrator.run(catalogue, cancel).await?;

            let lineage_path = store_dir.join("lineage.json");
            std::fs::write(&lineage_path, serde_json::to_string_pretty(&outcome.lineage)?)?;
            info!(path = %lineage_path.display(), "lineage saved");

            print_report(&outcome.report);
        }
        Commands::Report { store_dir } => {
            let store = JsonFileStore::new(&store_dir)?;
            let Some(report) = store.get_report().await? else {
                println!("No completed run found in {}", store_dir.display());
                return Ok(());
            };
            print_report(&report);
        }
        Commands::Tasks => {
            let catalogue = builtin_catalogue();
            println!("Built-in tasks ({})", catalogue.len());
            for task in catalogue {
                println!(
                    "  {} | {} | difficulty {:.1} | {}",
                    task.id, task.task_type, task.difficulty, task.prompt
                );
            }
        }
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!("\n=== Run Report ({}) ===", report.run_id);
    println!("Model: {}", report.model);
    println!(
        "Generations: {} | Population: {} | Seed: {}",
        report.total_generations, report.population_size, report.seed
    );
    println!(
        "Train calibration: evolved {:.1}% vs raw {:.1}% (gap {:+.1}%)",
        report.evolved_train_calibration * 100.0,
        report.raw_train_calibration * 100.0,
        report.train_gap * 100.0,
    );
    println!(
        "Test calibration ({} held-out tasks): evolved {:.1}% vs raw {:.1}% (gap {:+.1}%)",
        report.held_out_task_count,
        report.evolved_test_calibration * 100.0,
        report.raw_test_calibration * 100.0,
        report.test_gap * 100.0,
    );
    println!("Dominant strategy: {}", report.dominant_strategy);
    if report.extinct_strategies.is_empty() {
        println!("Extinct strategies: none");
    } else {
        let extinct: Vec<String> =
            report.extinct_strategies.iter().map(|s| s.to_string()).collect();
        println!("Extinct strategies: {}", extinct.join(", "));
    }
    let tc = &report.trait_convergence;
    println!(
        "Converged traits: bias {:+.3} (±{:.3}) | temperature {:.2} (±{:.2}) | risk {:.2} (±{:.2})",
        tc.confidence_bias.mean,
        tc.confidence_bias.std,
        tc.temperature.mean,
        tc.temperature.std,
        tc.risk_tolerance.mean,
        tc.risk_tolerance.std,
    );

    // The verdict the tool exists to give.
    if report.test_gap > 0.02 {
        println!(
            "\nVerdict: behavioral configuration holds up on held-out tasks \
             (+{:.1}%). Tune the agent before buying a bigger model.",
            report.test_gap * 100.0
        );
    } else if report.test_gap < -0.02 {
        println!(
            "\nVerdict: evolved gains do not generalize ({:.1}% on held-out tasks). \
             The bottleneck is the model, not the configuration.",
            report.test_gap * 100.0
        );
    } else {
        println!(
            "\nVerdict: no meaningful held-out difference ({:+.1}%). \
             Configuration changes are not moving calibration either way.",
            report.test_gap * 100.0
        );
    }
}
