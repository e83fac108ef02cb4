use thiserror::Error;

/// Failures surfaced by the decision engine.
///
/// None of these are retried internally: every variant means the caller handed the
/// engine inconsistent inputs or configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("word '{word}' is not in the vocabulary")]
    UnknownWord { word: String },
    #[error("word '{word}' appears more than once in the vocabulary")]
    DuplicateWord { word: String },
    #[error("{context}: expected {expected}, found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("no codes of length {code_length} can be drawn from {slots} keyword slots")]
    EmptyCodeSpace { slots: usize, code_length: usize },
    #[error("support index {index} appears more than once in a belief")]
    DuplicateSupportIndex { index: usize },
    #[error("compression threshold {threshold} must lie in (0, 1]")]
    InvalidThreshold { threshold: f64 },
    #[error("similarity temperature {temperature} must be positive and finite")]
    InvalidTemperature { temperature: f64 },
    #[error("{context}: no probability mass left above the log-zero sentinel")]
    NoProbabilityMass { context: &'static str },
}

impl DecodeError {
    pub(crate) fn dimension(context: &'static str, expected: usize, found: usize) -> Self {
        DecodeError::DimensionMismatch {
            context,
            expected,
            found,
        }
    }
}
