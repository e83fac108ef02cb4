use crate::guesser::GuesserError;
use decrypto_core::heuristic::{ExactMatch, Heuristic, SimilarityHeuristic};
use std::fmt;
use std::sync::Arc;

/// Heuristic shared between guessers and the simulation that drives them.
pub type SharedHeuristic = Arc<dyn Heuristic + Send + Sync>;

/// Which compatibility heuristic a guesser scores clues with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeuristicKind {
    ExactMatch,
    Similarity { temperature: f64 },
}

impl HeuristicKind {
    /// Builds the heuristic over a vocabulary of `vocabulary_size` words.
    ///
    /// Similarity scoring needs one embedding row per vocabulary word.
    pub fn build(
        self,
        vocabulary_size: usize,
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<SharedHeuristic, GuesserError> {
        match self {
            HeuristicKind::ExactMatch => Ok(Arc::new(ExactMatch::new(vocabulary_size))),
            HeuristicKind::Similarity { temperature } => {
                let rows = embeddings
                    .filter(|rows| rows.len() == vocabulary_size)
                    .ok_or(GuesserError::MissingEmbeddings {
                        expected: vocabulary_size,
                    })?;
                Ok(Arc::new(SimilarityHeuristic::new(rows, temperature)?))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeuristicKind::ExactMatch => "exact_match",
            HeuristicKind::Similarity { .. } => "similarity",
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeuristicKind::ExactMatch => f.write_str("exact_match"),
            HeuristicKind::Similarity { temperature } => {
                write!(f, "similarity(t={temperature})")
            }
        }
    }
}
