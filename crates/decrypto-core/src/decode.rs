//! Code scoring and arg-max decoding.

use crate::belief::{Belief, NO_COMPRESSION, compress_batch};
use crate::code::{Code, CodeSpace};
use crate::error::DecodeError;
use crate::expectation::{ExpectationMatrix, expectation_matrix};
use crate::heuristic::Heuristic;
use crate::vocab::WordIndex;
use rand::Rng;

/// Scores every candidate code for `clue` and picks the best.
///
/// A code's log-score is the sum of its `(slot, position)` entries in the expectation
/// matrix. Ties go to the code enumerated first.
pub fn decode<'a, H: Heuristic + ?Sized>(
    beliefs: &[Belief],
    clue: &[WordIndex],
    heuristic: &H,
    space: &'a CodeSpace,
) -> Result<Decoded<'a>, DecodeError> {
    if beliefs.len() < clue.len() || clue.is_empty() {
        return Err(DecodeError::EmptyCodeSpace {
            slots: beliefs.len(),
            code_length: clue.len(),
        });
    }
    if space.slots() != beliefs.len() {
        return Err(DecodeError::dimension(
            "code space slots vs beliefs",
            space.slots(),
            beliefs.len(),
        ));
    }
    if space.code_length() != clue.len() {
        return Err(DecodeError::dimension(
            "code space length vs clue",
            space.code_length(),
            clue.len(),
        ));
    }

    let matrix = expectation_matrix(beliefs, clue, heuristic)?;
    let scores = score_codes(&matrix, space);
    let best = arg_max(&scores);
    Ok(Decoded {
        space,
        scores,
        best,
    })
}

fn score_codes(matrix: &ExpectationMatrix, space: &CodeSpace) -> Vec<f64> {
    space
        .iter()
        .map(|code| {
            code.iter()
                .enumerate()
                .map(|(position, &slot)| matrix.get(slot, position))
                .sum::<f64>()
        })
        .collect()
}

fn arg_max(scores: &[f64]) -> usize {
    let mut best = 0;
    for (position, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = position;
        }
    }
    best
}

/// Number of codes ranked ahead of `position`: strictly higher scores, or equal
/// scores enumerated earlier.
pub fn rank_of_position(scores: &[f64], position: usize) -> usize {
    let target = scores[position];
    scores
        .iter()
        .enumerate()
        .filter(|(other, score)| **score > target || (**score == target && *other < position))
        .count()
}

/// Decoder settings applied to every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoder {
    /// Cumulative mass each belief keeps before scoring; `1.0` disables compression.
    pub compression_threshold: f64,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            compression_threshold: NO_COMPRESSION,
        }
    }
}

impl Decoder {
    pub fn new(compression_threshold: f64) -> Self {
        Self {
            compression_threshold,
        }
    }

    pub fn decode<'a, H: Heuristic + ?Sized>(
        &self,
        beliefs: &[Belief],
        clue: &[WordIndex],
        heuristic: &H,
        space: &'a CodeSpace,
    ) -> Result<Decoded<'a>, DecodeError> {
        if self.compression_threshold >= NO_COMPRESSION {
            return decode(beliefs, clue, heuristic, space);
        }
        let compressed = compress_batch(beliefs, self.compression_threshold)?;
        decode(&compressed, clue, heuristic, space)
    }
}

/// Decoder output: best code plus the score of every code in enumeration order.
#[derive(Debug, Clone)]
pub struct Decoded<'a> {
    space: &'a CodeSpace,
    scores: Vec<f64>,
    best: usize,
}

impl<'a> Decoded<'a> {
    pub fn space(&self) -> &'a CodeSpace {
        self.space
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn best_position(&self) -> usize {
        self.best
    }

    pub fn best_code(&self) -> Code {
        self.code_at(self.best)
    }

    pub fn best_score(&self) -> f64 {
        self.scores[self.best]
    }

    pub fn into_parts(self) -> (Code, Vec<f64>) {
        (self.best_code(), self.scores)
    }

    /// Best score minus the runner-up; `None` when the space holds a single code.
    pub fn margin(&self) -> Option<f64> {
        let runner_up = self
            .scores
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != self.best)
            .map(|(_, score)| *score)
            .fold(None, |acc: Option<f64>, score| {
                Some(acc.map_or(score, |current| current.max(score)))
            })?;
        Some(self.best_score() - runner_up)
    }

    /// The `count` best codes, ordered by score with ties in enumeration order.
    pub fn top(&self, count: usize) -> Vec<(Code, f64)> {
        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        order.sort_by(|a, b| {
            self.scores[*b]
                .total_cmp(&self.scores[*a])
                .then(a.cmp(b))
        });
        order
            .into_iter()
            .take(count)
            .map(|position| (self.code_at(position), self.scores[position]))
            .collect()
    }

    /// Probability of each code after normalizing the scores (max-shifted softmax).
    pub fn posterior(&self) -> Vec<f64> {
        let max = self.best_score();
        let weights: Vec<f64> = self
            .scores
            .iter()
            .map(|score| (score - max).exp())
            .collect();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|weight| weight / total).collect()
    }

    /// Draws a code from [`Decoded::posterior`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Code {
        let posterior = self.posterior();
        let total: f64 = posterior.iter().sum();
        let mut choice = rng.gen_range(0.0..total);
        for (position, weight) in posterior.iter().enumerate() {
            if choice < *weight {
                return self.code_at(position);
            }
            choice -= weight;
        }
        self.best_code()
    }

    /// Rank of `code` when codes are ordered by score (0 = best).
    pub fn rank_of(&self, code: &Code) -> Option<usize> {
        let position = self.space.position_of(code)?;
        Some(rank_of_position(&self.scores, position))
    }

    fn code_at(&self, position: usize) -> Code {
        self.space
            .get(position)
            .map(Code::from)
            .unwrap_or_else(|| Code::new(Vec::new()))
    }
}
