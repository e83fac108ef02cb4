mod history;
mod logging;

pub use history::BeliefHistory;
pub use logging::GUESS_DETAILS_ENV;

use crate::policy::{ArgMaxPolicy, GuessPolicy, SharedHeuristic};
use decrypto_core::belief::{BatchMetrics, Belief, NO_COMPRESSION};
use decrypto_core::code::{Code, CodeSpace, CodeSpaceCache};
use decrypto_core::decode::{Decoder, rank_of_position};
use decrypto_core::error::DecodeError;
use decrypto_core::vocab::{Vocabulary, WordIndex};
use std::sync::Arc;
use thiserror::Error;

/// Candidates kept on every [`Guess`] for diagnostics.
pub const TOP_CANDIDATES: usize = 3;

#[derive(Debug, Error)]
pub enum GuesserError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("similarity heuristic requires embeddings for all {expected} vocabulary words")]
    MissingEmbeddings { expected: usize },
}

/// Tunables shared by every guesser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuesserConfig {
    /// Cumulative belief mass kept before scoring; `1.0` keeps every entry.
    pub compression_threshold: f64,
    /// Number of `(slots, code length)` enumerations kept alive.
    pub code_cache_capacity: usize,
}

impl Default for GuesserConfig {
    fn default() -> Self {
        Self {
            compression_threshold: NO_COMPRESSION,
            code_cache_capacity: 4,
        }
    }
}

/// One announced guess plus the diagnostics behind it.
#[derive(Debug, Clone)]
pub struct Guess {
    /// Code chosen by the policy.
    pub code: Code,
    /// Highest-scoring code (equal to `code` under arg-max).
    pub best_code: Code,
    pub best_score: f64,
    pub margin: Option<f64>,
    /// Best codes in rank order, at most [`TOP_CANDIDATES`] of them.
    pub top: Vec<(Code, f64)>,
    /// Log-score of every code, aligned with `space`.
    pub scores: Vec<f64>,
    pub space: Arc<CodeSpace>,
    pub metrics: BatchMetrics,
}

impl Guess {
    /// Rank of `code` among all candidates (0 = best), if it is a valid code.
    pub fn rank_of(&self, code: &Code) -> Option<usize> {
        let position = self.space.position_of(code)?;
        Some(rank_of_position(&self.scores, position))
    }

    pub fn is_correct(&self, code: &Code) -> bool {
        &self.code == code
    }
}

/// Run metadata attached to guess events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessTelemetry {
    pub run_id: String,
    pub round: usize,
}

/// What a reveal changed in the guesser's beliefs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealOutcome {
    /// Slots whose belief was replaced by a posterior.
    pub updated: Vec<usize>,
    /// Slots whose prior was kept because the evidence left no mass.
    pub contradicted: Vec<usize>,
}

/// Automated guesser for one side of the table.
///
/// Holds one belief per keyword slot. Beliefs are replaced, never edited, and each
/// replaced belief is kept in the per-slot history.
pub struct Guesser {
    name: String,
    vocabulary: Arc<Vocabulary>,
    heuristic: SharedHeuristic,
    beliefs: Vec<Belief>,
    history: BeliefHistory,
    decoder: Decoder,
    codes: CodeSpaceCache,
    policy: Box<dyn GuessPolicy>,
    telemetry: Option<GuessTelemetry>,
    guesses: usize,
}

impl Guesser {
    /// Guesser for a team that knows its own keywords.
    pub fn for_team<S: AsRef<str>>(
        name: impl Into<String>,
        vocabulary: Arc<Vocabulary>,
        keywords: &[S],
        heuristic: SharedHeuristic,
        config: GuesserConfig,
    ) -> Result<Self, GuesserError> {
        let indices = vocabulary.indices_of(keywords)?;
        let beliefs = indices
            .into_iter()
            .map(|index| Belief::certain(index, vocabulary.len()))
            .collect();
        Self::with_beliefs(name, vocabulary, beliefs, heuristic, config)
    }

    /// Guesser intercepting an opponent whose `slots` keywords are unknown.
    pub fn intercepting(
        name: impl Into<String>,
        vocabulary: Arc<Vocabulary>,
        slots: usize,
        heuristic: SharedHeuristic,
        config: GuesserConfig,
    ) -> Result<Self, GuesserError> {
        let beliefs = vec![Belief::uniform(vocabulary.len()); slots];
        Self::with_beliefs(name, vocabulary, beliefs, heuristic, config)
    }

    /// Guesser seeded with caller-built beliefs, one per slot.
    pub fn with_beliefs(
        name: impl Into<String>,
        vocabulary: Arc<Vocabulary>,
        beliefs: Vec<Belief>,
        heuristic: SharedHeuristic,
        config: GuesserConfig,
    ) -> Result<Self, GuesserError> {
        if heuristic.domain_size() != vocabulary.len() {
            return Err(DecodeError::DimensionMismatch {
                context: "heuristic domain vs vocabulary",
                expected: vocabulary.len(),
                found: heuristic.domain_size(),
            }
            .into());
        }
        // Rejects an out-of-range threshold at construction.
        decrypto_core::belief::compress_batch(&[], config.compression_threshold)?;

        Ok(Self {
            name: name.into(),
            history: BeliefHistory::new(beliefs.len()),
            vocabulary,
            heuristic,
            beliefs,
            decoder: Decoder::new(config.compression_threshold),
            codes: CodeSpaceCache::new(config.code_cache_capacity),
            policy: Box::new(ArgMaxPolicy),
            telemetry: None,
            guesses: 0,
        })
    }

    pub fn with_policy(mut self, policy: Box<dyn GuessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Tags subsequent guess events with run metadata.
    pub fn set_telemetry(&mut self, telemetry: Option<GuessTelemetry>) {
        self.telemetry = telemetry;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn beliefs(&self) -> &[Belief] {
        &self.beliefs
    }

    pub fn history(&self) -> &BeliefHistory {
        &self.history
    }

    pub fn guesses(&self) -> usize {
        self.guesses
    }

    /// Guesses the code behind a clue given as words.
    pub fn guess<S: AsRef<str>>(&mut self, clue: &[S]) -> Result<Guess, GuesserError> {
        let indices = self.vocabulary.indices_of(clue)?;
        self.guess_indices(&indices)
    }

    /// Guesses the code behind a clue given as vocabulary indices.
    pub fn guess_indices(&mut self, clue: &[WordIndex]) -> Result<Guess, GuesserError> {
        let space = self.codes.get_or_build(self.beliefs.len(), clue.len())?;
        let decoded = self
            .decoder
            .decode(&self.beliefs, clue, &self.heuristic, &space)?;
        let code = self.policy.choose(&decoded);
        let margin = decoded.margin();
        let best_score = decoded.best_score();
        let top = decoded.top(TOP_CANDIDATES);
        let (best_code, scores) = decoded.into_parts();

        self.guesses += 1;
        let guess = Guess {
            code,
            best_code,
            best_score,
            margin,
            top,
            scores,
            space,
            metrics: BatchMetrics::from_beliefs(&self.beliefs),
        };
        logging::log_guess_decision(self, clue, &guess, self.policy.label());
        Ok(guess)
    }

    /// Folds a revealed `(clue, code)` pair into the beliefs of the revealed slots.
    pub fn observe_reveal<S: AsRef<str>>(
        &mut self,
        clue: &[S],
        code: &Code,
    ) -> Result<RevealOutcome, GuesserError> {
        let indices = self.vocabulary.indices_of(clue)?;
        self.observe_reveal_indices(&indices, code)
    }

    pub fn observe_reveal_indices(
        &mut self,
        clue: &[WordIndex],
        code: &Code,
    ) -> Result<RevealOutcome, GuesserError> {
        if code.len() != clue.len() {
            return Err(DecodeError::DimensionMismatch {
                context: "revealed code length vs clue",
                expected: clue.len(),
                found: code.len(),
            }
            .into());
        }
        if let Some(&slot) = code.slots().iter().find(|slot| **slot >= self.beliefs.len()) {
            return Err(DecodeError::DimensionMismatch {
                context: "revealed slot bound",
                expected: self.beliefs.len(),
                found: slot + 1,
            }
            .into());
        }

        let mut outcome = RevealOutcome::default();
        for (&slot, &word) in code.slots().iter().zip(clue) {
            match self.beliefs[slot].observe(word, &self.heuristic) {
                Ok(posterior) => {
                    let prior = std::mem::replace(&mut self.beliefs[slot], posterior);
                    self.history.record(slot, prior);
                    outcome.updated.push(slot);
                }
                Err(DecodeError::NoProbabilityMass { .. }) => {
                    logging::log_contradiction(self, slot, word);
                    outcome.contradicted.push(slot);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(outcome)
    }
}
