use super::Heuristic;
use crate::error::DecodeError;
use crate::logspace::clamp_log;
use crate::vocab::WordIndex;

/// Dense `clue × keyword` score matrix, row-major by clue.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    domain_size: usize,
    scores: Vec<f64>,
}

impl ScoreTable {
    pub fn new(domain_size: usize, scores: Vec<f64>) -> Result<Self, DecodeError> {
        let expected = domain_size * domain_size;
        if scores.len() != expected {
            return Err(DecodeError::dimension(
                "score table entries",
                expected,
                scores.len(),
            ));
        }
        let scores = scores.into_iter().map(clamp_log).collect();
        Ok(Self {
            domain_size,
            scores,
        })
    }

    /// Builds a table by evaluating `score(clue, keyword)` for every pair.
    pub fn from_fn<F>(domain_size: usize, mut score: F) -> Self
    where
        F: FnMut(WordIndex, WordIndex) -> f64,
    {
        let mut scores = Vec::with_capacity(domain_size * domain_size);
        for clue in 0..domain_size {
            for keyword in 0..domain_size {
                scores.push(clamp_log(score(clue, keyword)));
            }
        }
        Self {
            domain_size,
            scores,
        }
    }

    /// Snapshots any heuristic into a table.
    pub fn materialize<H: Heuristic + ?Sized>(heuristic: &H) -> Self {
        Self::from_fn(heuristic.domain_size(), |clue, keyword| {
            heuristic.score(clue, keyword)
        })
    }
}

impl Heuristic for ScoreTable {
    fn domain_size(&self) -> usize {
        self.domain_size
    }

    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        self.scores[clue * self.domain_size + keyword]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristic::ExactMatch;
    use crate::logspace::LOG_ZERO;

    #[test]
    fn rejects_non_square_input() {
        let err = ScoreTable::new(3, vec![0.0; 8]).expect_err("8 != 9");
        assert_eq!(
            err,
            DecodeError::DimensionMismatch {
                context: "score table entries",
                expected: 9,
                found: 8
            }
        );
    }

    #[test]
    fn row_major_by_clue() {
        let table = ScoreTable::new(2, vec![-0.1, -0.2, -0.3, -0.4]).expect("square");
        assert_eq!(table.score(0, 1), -0.2);
        assert_eq!(table.score(1, 0), -0.3);
    }

    #[test]
    fn clamps_below_sentinel() {
        let table = ScoreTable::new(1, vec![f64::NEG_INFINITY]).expect("square");
        assert_eq!(table.score(0, 0), LOG_ZERO);
    }

    #[test]
    fn materialize_copies_scores() {
        let exact = ExactMatch::new(3);
        let table = ScoreTable::materialize(&exact);
        for clue in 0..3 {
            for keyword in 0..3 {
                assert_eq!(table.score(clue, keyword), exact.score(clue, keyword));
            }
        }
    }
}
