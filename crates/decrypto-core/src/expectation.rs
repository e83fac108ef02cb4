//! Batched log-domain expectation of clue likelihoods under slot beliefs.
//!
//! Entry `(slot, position)` of the result is
//! `log Σ_k exp(belief_slot(k) + score(clue_position, k))` over the live terms,
//! computed with the max-shift stabilization from [`crate::logspace::log_sum_exp_live`].
//! A term is dead when either operand is at or below the sentinel.

use crate::belief::Belief;
use crate::error::DecodeError;
use crate::heuristic::Heuristic;
use crate::logspace::{LOG_ZERO, is_live_term, log_sum_exp_live};
use crate::vocab::WordIndex;

/// Dense `slots × clue positions` matrix of log-expectations, row-major by slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectationMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ExpectationMatrix {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, slot: usize, position: usize) -> f64 {
        self.values[slot * self.cols + position]
    }

    pub fn row(&self, slot: usize) -> &[f64] {
        &self.values[slot * self.cols..(slot + 1) * self.cols]
    }
}

/// Computes the full matrix for every `(belief, clue word)` combination.
pub fn expectation_matrix<H: Heuristic + ?Sized>(
    beliefs: &[Belief],
    clue: &[WordIndex],
    heuristic: &H,
) -> Result<ExpectationMatrix, DecodeError> {
    let domain = heuristic.domain_size();
    validate_domain(beliefs, clue, domain)?;

    let cols = clue.len();
    let mut values = Vec::with_capacity(beliefs.len() * cols);
    let width = beliefs.iter().map(Belief::support_len).max().unwrap_or(0);
    let mut terms = Vec::with_capacity(width);

    for belief in beliefs {
        if let [(keyword, log_p)] = belief.support() {
            // Single-entry supports need no reduction.
            values.extend(clue.iter().map(|&word| {
                let score = heuristic.score(word, *keyword);
                if is_live_term(*log_p, score) {
                    log_p + score
                } else {
                    LOG_ZERO
                }
            }));
            continue;
        }

        for &word in clue {
            terms.clear();
            terms.extend(belief.iter().filter_map(|(keyword, log_p)| {
                let score = heuristic.score(word, keyword);
                is_live_term(log_p, score).then_some(log_p + score)
            }));
            values.push(log_sum_exp_live(&terms));
        }
    }

    Ok(ExpectationMatrix {
        rows: beliefs.len(),
        cols,
        values,
    })
}

fn validate_domain(
    beliefs: &[Belief],
    clue: &[WordIndex],
    domain: usize,
) -> Result<(), DecodeError> {
    for belief in beliefs {
        if belief.vocabulary_size() != domain {
            return Err(DecodeError::dimension(
                "belief vocabulary vs heuristic domain",
                domain,
                belief.vocabulary_size(),
            ));
        }
        // Support is index-sorted, so the last entry carries the largest index.
        if let Some(&(index, _)) = belief.support().last() {
            if index >= domain {
                return Err(DecodeError::dimension(
                    "belief support index bound",
                    domain,
                    index + 1,
                ));
            }
        }
    }
    if let Some(&word) = clue.iter().max() {
        if word >= domain {
            return Err(DecodeError::dimension("clue index bound", domain, word + 1));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::{ExactMatch, ScoreTable};

    #[test]
    fn certain_beliefs_pick_out_matching_clues() {
        let beliefs = [Belief::certain(1, 4), Belief::certain(0, 4)];
        let matrix = expectation_matrix(&beliefs, &[0, 1], &ExactMatch::new(4)).expect("valid");
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 2);
        assert_eq!(matrix.row(0), &[LOG_ZERO, 0.0]);
        assert_eq!(matrix.row(1), &[0.0, LOG_ZERO]);
    }

    #[test]
    fn uniform_belief_averages_likelihood() {
        let table = ScoreTable::from_fn(2, |clue, keyword| {
            if clue == keyword { 0.5f64.ln() } else { 0.25f64.ln() }
        });
        let matrix =
            expectation_matrix(&[Belief::uniform(2)], &[0], &table).expect("valid");
        let expected = (0.5 * 0.5 + 0.5 * 0.25f64).ln();
        assert!((matrix.get(0, 0) - expected).abs() < 1e-12);
    }

    #[test]
    fn impossible_clue_yields_sentinel() {
        let belief = Belief::uniform_over(&[0, 1], 4).expect("valid");
        let matrix = expectation_matrix(&[belief], &[3], &ExactMatch::new(4)).expect("valid");
        assert_eq!(matrix.get(0, 0), LOG_ZERO);
        assert!(!matrix.get(0, 0).is_nan());
    }

    #[test]
    fn degenerate_and_dense_rows_agree() {
        let mut scores = vec![LOG_ZERO; 5];
        scores[2] = 0.0;
        let dense = Belief::from_scores(&scores, 5).expect("valid");
        let certain = Belief::certain(2, 5);
        let clue = [0, 2, 4];
        let heuristic = ExactMatch::new(5);
        let dense_row = expectation_matrix(&[dense], &clue, &heuristic).expect("valid");
        let certain_row = expectation_matrix(&[certain], &clue, &heuristic).expect("valid");
        assert_eq!(dense_row.row(0), certain_row.row(0));
    }

    #[test]
    fn positive_scores_do_not_revive_sentinel_entries() {
        let table = ScoreTable::from_fn(3, |clue, keyword| {
            if clue == keyword { 5.0 } else { LOG_ZERO }
        });
        let dense = Belief::from_scores(&[LOG_ZERO, LOG_ZERO, 0.0], 3).expect("valid");
        let certain = Belief::certain(2, 3);
        let clue = [0, 1, 2];
        let dense_row = expectation_matrix(&[dense], &clue, &table).expect("valid");
        let certain_row = expectation_matrix(&[certain], &clue, &table).expect("valid");
        assert_eq!(dense_row.row(0), &[LOG_ZERO, LOG_ZERO, 5.0]);
        assert_eq!(dense_row.row(0), certain_row.row(0));
    }

    #[test]
    fn faint_rows_below_the_sentinel_stay_ordered() {
        let table = ScoreTable::from_fn(2, |_, _| -900.0);
        let beliefs = [
            Belief::from_entries(vec![(0, -200.0)], 2).expect("valid"),
            Belief::from_entries(vec![(0, -150.0)], 2).expect("valid"),
            Belief::from_entries(vec![(0, -200.0), (1, -210.0)], 2).expect("valid"),
        ];
        let matrix = expectation_matrix(&beliefs, &[0], &table).expect("valid");
        assert_eq!(matrix.get(0, 0), -1_100.0);
        assert_eq!(matrix.get(1, 0), -1_050.0);
        assert!(matrix.get(0, 0) < matrix.get(1, 0));
        assert!(matrix.get(2, 0) > matrix.get(0, 0));
    }

    #[test]
    fn out_of_domain_inputs_are_rejected() {
        let heuristic = ExactMatch::new(4);
        assert!(matches!(
            expectation_matrix(&[Belief::certain(4, 4)], &[0], &heuristic),
            Err(DecodeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            expectation_matrix(&[Belief::certain(0, 5)], &[0], &heuristic),
            Err(DecodeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            expectation_matrix(&[Belief::certain(0, 4)], &[4], &heuristic),
            Err(DecodeError::DimensionMismatch { .. })
        ));
    }
}
