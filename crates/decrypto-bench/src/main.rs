use std::path::PathBuf;

use clap::Parser;

use decrypto_bench::config::{BenchmarkConfig, ResolvedOutputs};
use decrypto_bench::logging::init_logging;
use decrypto_bench::simulation::SimulationRunner;

/// Simulated-game benchmarking harness for Decrypto guessers.
#[derive(Debug, Parser)]
#[command(
    name = "decrypto-bench",
    author,
    version,
    about = "Deterministic Decrypto guessing harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of rounds to play.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<usize>,

    /// Override the RNG seed for game generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,

    /// Enable per-guess top-k telemetry regardless of config (forces DECRYPTO_GUESS_DETAILS=1).
    #[arg(long)]
    log_guess_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(rounds) = cli.rounds {
        config.game.rounds = rounds;
    }

    if let Some(seed) = cli.seed {
        config.game.seed = Some(seed);
    }

    if cli.log_guess_details {
        config.logging.guess_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let guesser_count = config.guessers.len();
    let run_id = config.run_id.clone();
    let rounds = config.game.rounds;

    println!(
        "Loaded configuration '{run_id}' with {guesser_count} guesser{} ({rounds} rounds, {} keywords, code length {})",
        if guesser_count == 1 { "" } else { "s" },
        config.game.keywords,
        config.game.code_length,
    );

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = SimulationRunner::new(config, outputs)?;

    let summary = runner.run()?;
    println!(
        "Simulation complete for '{run_id}': {} rounds × {} guessers → {} rows at {}",
        summary.rounds_played,
        summary.guessers,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        if let Some(margin) = outputs.summary.guess.avg_margin {
            println!(
                "  Guess decisions: {} events, avg best-vs-next margin {:.3}",
                outputs.summary.guess.count, margin
            );
        } else {
            println!(
                "  Guess decisions: {} events captured",
                outputs.summary.guess.count
            );
        }
    }

    Ok(())
}
