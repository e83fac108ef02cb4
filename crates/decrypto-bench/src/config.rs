use decrypto_bot::HeuristicKind;
use decrypto_core::belief::NO_COMPRESSION;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_CLUE_POOL: usize = 3;
const DEFAULT_DIMENSION: usize = 16;
const DEFAULT_TEMPERATURE: f64 = 0.2;
const DEFAULT_LATENCY_BUDGET_MS: u64 = 50;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub game: GameConfig,
    pub vocabulary: VocabularyConfig,
    pub guessers: Vec<GuesserEntry>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.game.validate()?;
        self.vocabulary.validate(&self.game)?;
        self.outputs.validate(&self.run_id)?;
        validate_guessers(&self.guessers)?;
        self.metrics.validate(&self.guessers)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// How the simulated clue-giver picks a clue word for a keyword.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClueStyle {
    /// The clue is the keyword itself.
    Literal,
    /// The clue is drawn from the keyword's nearest non-keyword neighbours.
    Associative,
}

/// Game shape shared by every simulated round.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub rounds: usize,
    pub keywords: usize,
    pub code_length: usize,
    pub clue_style: ClueStyle,
    #[serde(default = "default_clue_pool")]
    pub clue_pool: usize,
    /// Guessers start without the keywords and learn them from reveals.
    #[serde(default)]
    pub intercept: bool,
}

impl GameConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.rounds == 0 {
            return Err(invalid(
                "game.rounds",
                "number of rounds must be greater than zero",
            ));
        }
        if self.keywords == 0 {
            return Err(invalid("game.keywords", "at least one keyword is required"));
        }
        if self.code_length == 0 || self.code_length > self.keywords {
            return Err(invalid(
                "game.code_length",
                format!("code length must be between 1 and {}", self.keywords),
            ));
        }
        if self.clue_pool == 0 {
            return Err(invalid("game.clue_pool", "clue pool must be at least 1"));
        }
        Ok(())
    }
}

fn default_clue_pool() -> usize {
    DEFAULT_CLUE_POOL
}

/// Word universe: either listed inline or generated as `w0000`, `w0001`, ...
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VocabularyConfig {
    #[serde(default)]
    pub words: Vec<String>,
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl VocabularyConfig {
    fn validate(&self, game: &GameConfig) -> Result<(), ValidationError> {
        if !self.words.is_empty() && self.size.is_some() {
            return Err(invalid(
                "vocabulary",
                "specify either vocabulary.words or vocabulary.size, not both",
            ));
        }
        let mut seen = HashSet::new();
        for word in &self.words {
            if word.trim().is_empty() {
                return Err(invalid("vocabulary.words", "words must not be empty"));
            }
            if !seen.insert(word.as_str()) {
                return Err(invalid(
                    "vocabulary.words",
                    format!("word '{word}' listed more than once"),
                ));
            }
        }

        let required = match game.clue_style {
            ClueStyle::Literal => game.keywords,
            ClueStyle::Associative => game.keywords + game.clue_pool,
        };
        let available = self.len();
        if available < required {
            return Err(invalid(
                "vocabulary",
                format!("{available} words cannot cover {required} keywords and clues"),
            ));
        }

        if self.dimension == 0 {
            return Err(invalid(
                "vocabulary.dimension",
                "embedding dimension must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.size.unwrap_or(self.words.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured words, generating placeholder names when only a size is given.
    pub fn resolve_words(&self) -> Vec<String> {
        match self.size {
            Some(size) => (0..size).map(|index| format!("w{index:04}")).collect(),
            None => self.words.clone(),
        }
    }
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GuesserKindConfig {
    ExactMatch,
    Similarity,
}

/// Definition of one competing guesser.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GuesserEntry {
    pub name: String,
    pub kind: GuesserKindConfig,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold: f64,
}

impl GuesserEntry {
    pub fn heuristic_kind(&self) -> HeuristicKind {
        match self.kind {
            GuesserKindConfig::ExactMatch => HeuristicKind::ExactMatch,
            GuesserKindConfig::Similarity => HeuristicKind::Similarity {
                temperature: self.temperature,
            },
        }
    }
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_compression_threshold() -> f64 {
    NO_COMPRESSION
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(label, "path must not be empty"));
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(invalid(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Metrics configuration block.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetricsConfig {
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, guessers: &[GuesserEntry]) -> Result<(), ValidationError> {
        let Some(baseline) = self.baseline.as_ref() else {
            return Err(invalid(
                "metrics.baseline",
                "baseline guesser must be specified",
            ));
        };

        if !guessers.iter().any(|g| &g.name == baseline) {
            return Err(invalid(
                "metrics.baseline",
                format!("baseline guesser '{baseline}' is not defined in guessers list"),
            ));
        }

        if self.latency_budget_ms == 0 {
            return Err(invalid(
                "metrics.latency_budget_ms",
                "latency budget must be greater than zero",
            ));
        }

        Ok(())
    }
}

fn default_latency_budget_ms() -> u64 {
    DEFAULT_LATENCY_BUDGET_MS
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub guess_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            guess_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(invalid("run_id", "run_id must not be empty"));
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(invalid(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }

    Ok(())
}

fn validate_guessers(guessers: &[GuesserEntry]) -> Result<(), ValidationError> {
    if guessers.is_empty() {
        return Err(invalid("guessers", "at least one guesser must be specified"));
    }

    let mut seen = HashSet::new();
    for guesser in guessers {
        if guesser.name.trim().is_empty() {
            return Err(invalid("guessers.name", "guesser name must not be empty"));
        }

        if !guesser.name.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
            return Err(invalid(
                format!("guessers[{}].name", guesser.name),
                "guesser name contains invalid characters",
            ));
        }

        if !seen.insert(guesser.name.as_str()) {
            return Err(invalid(
                "guessers",
                format!("guesser name '{}' defined more than once", guesser.name),
            ));
        }

        if !(guesser.temperature.is_finite() && guesser.temperature > 0.0) {
            return Err(invalid(
                format!("guessers[{}].temperature", guesser.name),
                "temperature must be a positive number",
            ));
        }

        if !(guesser.compression_threshold > 0.0 && guesser.compression_threshold <= 1.0) {
            return Err(invalid(
                format!("guessers[{}].compression_threshold", guesser.name),
                "compression threshold must lie in (0, 1]",
            ));
        }
    }

    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.into(),
        message: message.into(),
    }
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

impl ResolvedOutputs {
    /// Directory holding the summary and telemetry artifacts.
    pub fn artifact_dir(&self) -> PathBuf {
        self.summary_md
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
