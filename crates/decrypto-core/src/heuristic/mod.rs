//! Compatibility heuristics between clue words and candidate keywords.
//!
//! A heuristic answers one question: how likely is `clue` to be given for `keyword`,
//! expressed as a natural-log likelihood. The decoder never inspects which variant it
//! was handed.
//!
//! - `exact`: the naive reference rule (a clue literally names its keyword).
//! - `table`: a dense precomputed matrix, e.g. exported from a trained model.
//! - `similarity`: softmax over cosine similarity of in-memory embeddings.

mod exact;
mod similarity;
mod table;

pub use exact::ExactMatch;
pub use similarity::SimilarityHeuristic;
pub use table::ScoreTable;

use crate::vocab::WordIndex;
use std::sync::Arc;

/// Scores a `(clue, keyword)` pair in log space.
///
/// Implementations must be deterministic and defined for every pair of indices below
/// [`Heuristic::domain_size`].
pub trait Heuristic {
    /// Number of word indices the heuristic is defined over.
    fn domain_size(&self) -> usize;

    /// `log P(clue | keyword)` or an analogous compatibility score.
    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64;
}

impl<H: Heuristic + ?Sized> Heuristic for &H {
    fn domain_size(&self) -> usize {
        (**self).domain_size()
    }

    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        (**self).score(clue, keyword)
    }
}

impl<H: Heuristic + ?Sized> Heuristic for Box<H> {
    fn domain_size(&self) -> usize {
        (**self).domain_size()
    }

    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        (**self).score(clue, keyword)
    }
}

impl<H: Heuristic + ?Sized> Heuristic for Arc<H> {
    fn domain_size(&self) -> usize {
        (**self).domain_size()
    }

    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        (**self).score(clue, keyword)
    }
}
