mod clues;

pub use clues::{ClueGiver, synthetic_embeddings};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use decrypto_bot::{GuessTelemetry, Guesser, GuesserConfig, GuesserError};
use decrypto_core::code::Code;
use decrypto_core::error::DecodeError;
use decrypto_core::heuristic::SimilarityHeuristic;
use decrypto_core::vocab::{Vocabulary, WordIndex};
use rand::seq::SliceRandom;
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, RoundOutcome};
use crate::config::{BenchmarkConfig, GuesserEntry, GuesserKindConfig, ResolvedOutputs};
use crate::logging;
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

/// Temperature of the geometry the clue-giver ranks neighbours with; only cosine order matters.
const CLUE_GEOMETRY_TEMPERATURE: f64 = 1.0;

/// Primary entry point for simulated games.
pub struct SimulationRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    game: GameSetup,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub rounds_played: usize,
    pub guessers: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

/// Everything fixed before the first guess: the word universe, its geometry, the
/// secret keywords and every round's `(code, clue)` pair.
pub struct GameSetup {
    pub vocabulary: Arc<Vocabulary>,
    pub embeddings: Vec<Vec<f32>>,
    pub keywords: Vec<WordIndex>,
    pub rounds: Vec<RoundSetup>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSetup {
    pub code: Code,
    pub clue: Vec<WordIndex>,
}

impl GameSetup {
    /// Deterministically deals a game from the configured seed.
    pub fn generate(config: &BenchmarkConfig) -> Result<Self, SimulationError> {
        let game = &config.game;
        let mut rng = StdRng::seed_from_u64(game.seed.unwrap_or(0));

        let vocabulary = Arc::new(Vocabulary::new(config.vocabulary.resolve_words())?);
        let embeddings =
            synthetic_embeddings(vocabulary.len(), config.vocabulary.dimension, &mut rng);
        let keywords = rand::seq::index::sample(&mut rng, vocabulary.len(), game.keywords).into_vec();

        let geometry = SimilarityHeuristic::new(&embeddings, CLUE_GEOMETRY_TEMPERATURE)?;
        let giver = ClueGiver::new(
            game.clue_style,
            keywords.clone(),
            &geometry,
            vocabulary.len(),
            game.clue_pool,
        );

        let mut slots: Vec<usize> = (0..game.keywords).collect();
        let rounds = (0..game.rounds)
            .map(|_| {
                slots.shuffle(&mut rng);
                let code = Code::new(slots[..game.code_length].to_vec());
                let clue = giver.give(&code, &mut rng);
                RoundSetup { code, clue }
            })
            .collect();

        Ok(Self {
            vocabulary,
            embeddings,
            keywords,
            rounds,
        })
    }

    fn keyword_words(&self) -> Vec<&str> {
        self.keywords
            .iter()
            .filter_map(|index| self.vocabulary.word_at(*index))
            .collect()
    }
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, SimulationError> {
        let game = GameSetup::generate(&config)?;
        // Surfaces heuristic errors before any output is written.
        for entry in &config.guessers {
            spawn_guesser(entry, &config, &game)?;
        }
        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            game,
        })
    }

    pub fn game(&self) -> &GameSetup {
        &self.game
    }

    /// Plays every round with every guesser, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, SimulationError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut guessers = self
            .config
            .guessers
            .iter()
            .map(|entry| spawn_guesser(entry, &self.config, &self.game).map(|g| (entry, g)))
            .collect::<Result<Vec<_>, _>>()?;
        let mut analytics = AnalyticsCollector::new(&self.config)?;
        let mut rows_written = 0usize;

        for (round_index, round) in self.game.rounds.iter().enumerate() {
            let mut outcomes = Vec::with_capacity(guessers.len());
            for (entry, guesser) in guessers.iter_mut() {
                let outcome = self.play_round(round_index, round, entry, guesser)?;
                write_row(&mut writer, &self.config.run_id, entry, &outcome)?;
                rows_written += 1;
                outcomes.push(outcome);
            }
            analytics.record_round(round_index, &outcomes)?;

            if self.config.game.intercept {
                for (_, guesser) in guessers.iter_mut() {
                    guesser.observe_reveal_indices(&round.clue, &round.code)?;
                }
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_dir = self.outputs.artifact_dir();
        let telemetry_path = self
            .logging_enabled
            .then(|| logging::telemetry_path(&self.outputs));

        let telemetry_outputs = if let Some(path) = telemetry_path.as_ref() {
            write_summary_outputs(path, &telemetry_dir)?
        } else {
            None
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            rounds_played: self.game.rounds.len(),
            guessers: guessers.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
            telemetry_outputs,
        })
    }

    fn play_round(
        &self,
        round_index: usize,
        round: &RoundSetup,
        entry: &GuesserEntry,
        guesser: &mut Guesser,
    ) -> Result<RoundOutcome, SimulationError> {
        guesser.set_telemetry(Some(GuessTelemetry {
            run_id: self.config.run_id.clone(),
            round: round_index,
        }));

        let start = Instant::now();
        let guess = guesser.guess_indices(&round.clue)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let candidates = guess.scores.len();
        let rank = guess.rank_of(&round.code).unwrap_or(candidates);
        let correct = guess.is_correct(&round.code);

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "decrypto_bench::round",
                Level::INFO,
                run_id = %self.config.run_id,
                round = round_index as u32,
                guesser = %entry.name,
                heuristic = entry.heuristic_kind().label(),
                code = %round.code,
                guessed = %guess.code,
                correct,
                rank = rank as u32,
                elapsed_ms
            );
        }

        Ok(RoundOutcome {
            guesser: entry.name.clone(),
            round: round_index,
            code: round.code.clone(),
            guessed: guess.code,
            correct,
            rank,
            candidates,
            best_score: guess.best_score,
            margin: guess.margin,
            certain_slots: guess.metrics.certain_slots,
            elapsed_ms,
        })
    }
}

fn spawn_guesser(
    entry: &GuesserEntry,
    config: &BenchmarkConfig,
    game: &GameSetup,
) -> Result<Guesser, SimulationError> {
    let embeddings = match entry.kind {
        GuesserKindConfig::ExactMatch => None,
        GuesserKindConfig::Similarity => Some(game.embeddings.as_slice()),
    };
    let heuristic = entry
        .heuristic_kind()
        .build(game.vocabulary.len(), embeddings)?;
    let guesser_config = GuesserConfig {
        compression_threshold: entry.compression_threshold,
        ..GuesserConfig::default()
    };

    let guesser = if config.game.intercept {
        Guesser::intercepting(
            entry.name.clone(),
            Arc::clone(&game.vocabulary),
            config.game.keywords,
            heuristic,
            guesser_config,
        )?
    } else {
        Guesser::for_team(
            entry.name.clone(),
            Arc::clone(&game.vocabulary),
            &game.keyword_words(),
            heuristic,
            guesser_config,
        )?
    };
    Ok(guesser)
}

fn ensure_parent(path: Option<&Path>) -> Result<(), SimulationError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    entry: &GuesserEntry,
    outcome: &RoundOutcome,
) -> Result<(), SimulationError> {
    let row = RoundLogRow {
        run_id,
        round: outcome.round,
        guesser: &entry.name,
        kind: entry.kind,
        heuristic: entry.heuristic_kind().to_string(),
        code: &outcome.code,
        guessed: &outcome.guessed,
        correct: outcome.correct,
        rank: outcome.rank,
        candidates: outcome.candidates,
        best_score: outcome.best_score,
        margin: outcome.margin,
        certain_slots: outcome.certain_slots,
        speed_ms: outcome.elapsed_ms,
    };
    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Serialize)]
struct RoundLogRow<'a> {
    run_id: &'a str,
    round: usize,
    guesser: &'a str,
    kind: GuesserKindConfig,
    heuristic: String,
    code: &'a Code,
    guessed: &'a Code,
    correct: bool,
    rank: usize,
    candidates: usize,
    best_score: f64,
    margin: Option<f64>,
    certain_slots: usize,
    speed_ms: f64,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Guesser(#[from] GuesserError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

impl From<DecodeError> for SimulationError {
    fn from(err: DecodeError) -> Self {
        SimulationError::Guesser(GuesserError::Decode(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(intercept: bool) -> BenchmarkConfig {
        let yaml = format!(
            r#"
run_id: "unit"
game:
  seed: 11
  rounds: 6
  keywords: 4
  code_length: 3
  clue_style: "associative"
  intercept: {intercept}
vocabulary:
  size: 24
  dimension: 8
guessers:
  - name: "exact"
    kind: "exact_match"
outputs:
  jsonl: "unused.jsonl"
  summary_md: "unused.md"
metrics:
  baseline: "exact"
"#
        );
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("yaml");
        cfg.validate().expect("valid");
        cfg
    }

    #[test]
    fn game_setup_is_seed_deterministic() {
        let cfg = config(false);
        let first = GameSetup::generate(&cfg).expect("game");
        let second = GameSetup::generate(&cfg).expect("game");
        assert_eq!(first.keywords, second.keywords);
        assert_eq!(first.rounds, second.rounds);
        assert_eq!(first.rounds.len(), 6);
    }

    #[test]
    fn rounds_use_distinct_slots_and_non_keyword_clues() {
        let cfg = config(false);
        let game = GameSetup::generate(&cfg).expect("game");
        let mut keywords = game.keywords.clone();
        keywords.sort_unstable();
        keywords.dedup();
        assert_eq!(keywords.len(), 4);

        for round in &game.rounds {
            let mut slots = round.code.slots().to_vec();
            assert!(slots.iter().all(|slot| *slot < 4));
            slots.sort_unstable();
            slots.dedup();
            assert_eq!(slots.len(), 3);
            assert!(round.clue.iter().all(|word| !game.keywords.contains(word)));
        }
    }
}
