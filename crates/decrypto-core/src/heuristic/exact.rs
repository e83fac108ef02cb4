use super::Heuristic;
use crate::logspace::LOG_ZERO;
use crate::vocab::WordIndex;

/// Treats a clue as literally naming its keyword: log 1 on a match, the sentinel otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExactMatch {
    domain_size: usize,
}

impl ExactMatch {
    pub fn new(domain_size: usize) -> Self {
        Self { domain_size }
    }
}

impl Heuristic for ExactMatch {
    fn domain_size(&self) -> usize {
        self.domain_size
    }

    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        if clue == keyword { 0.0 } else { LOG_ZERO }
    }
}
