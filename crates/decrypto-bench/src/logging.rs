use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use decrypto_bot::GUESS_DETAILS_ENV;
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Crates whose events make up a run's telemetry.
const TELEMETRY_CRATES: [&str; 2] = ["decrypto_bot", "decrypto_bench"];

/// Holds the writer guard; guess and round events keep flushing until it drops.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Where a run's guess and round events land, next to its summary table.
pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    outputs.artifact_dir().join(TELEMETRY_FILE)
}

/// `level` for the guesser and harness targets, `warn` for everything else.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = String::from("warn");
    for target in TELEMETRY_CRATES {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    if logging.guess_details {
        unsafe {
            std::env::set_var(GUESS_DETAILS_ENV, "1");
        }
    }

    let telemetry_path = telemetry_path(outputs);
    if let Some(dir) = telemetry_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating guess telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(&telemetry_path).with_context(|| {
        format!(
            "creating guess telemetry file at {}",
            telemetry_path.display()
        )
    })?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Back-to-back runs in one process keep the first subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}
