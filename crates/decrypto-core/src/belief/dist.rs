//! Sparse log-probability distribution over vocabulary indices.

use crate::error::DecodeError;
use crate::logspace::{LOG_ZERO, clamp_log, is_log_zero, log_normalize};
use crate::vocab::WordIndex;
use serde::Serialize;

/// What is believed about the word behind one keyword slot.
///
/// The support is stored sorted by word index; every index outside it carries
/// [`LOG_ZERO`]. Beliefs are values: updates and compression return new beliefs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Belief {
    vocabulary_size: usize,
    support: Vec<(WordIndex, f64)>,
}

impl Belief {
    /// Degenerate belief for a keyword known with certainty.
    pub fn certain(index: WordIndex, vocabulary_size: usize) -> Self {
        Self {
            vocabulary_size,
            support: vec![(index, 0.0)],
        }
    }

    /// Dense belief from one log-weight per vocabulary word.
    ///
    /// Weights need not be normalized; they are shifted so the mass sums to one.
    pub fn from_scores(scores: &[f64], vocabulary_size: usize) -> Result<Self, DecodeError> {
        if scores.len() != vocabulary_size {
            return Err(DecodeError::dimension(
                "belief scores",
                vocabulary_size,
                scores.len(),
            ));
        }
        let normalized = log_normalize(scores).ok_or(DecodeError::NoProbabilityMass {
            context: "belief scores",
        })?;
        Ok(Self {
            vocabulary_size,
            support: normalized.into_iter().enumerate().collect(),
        })
    }

    /// Equal mass on every vocabulary word.
    pub fn uniform(vocabulary_size: usize) -> Self {
        let log_p = -(vocabulary_size.max(1) as f64).ln();
        Self {
            vocabulary_size,
            support: (0..vocabulary_size).map(|index| (index, log_p)).collect(),
        }
    }

    /// Equal mass on `indices`, nothing elsewhere.
    pub fn uniform_over(
        indices: &[WordIndex],
        vocabulary_size: usize,
    ) -> Result<Self, DecodeError> {
        let log_p = -(indices.len().max(1) as f64).ln();
        Self::from_entries(
            indices.iter().map(|index| (*index, log_p)).collect(),
            vocabulary_size,
        )
    }

    /// Sparse belief from explicit `(index, log-probability)` pairs, stored as given.
    pub fn from_entries(
        mut entries: Vec<(WordIndex, f64)>,
        vocabulary_size: usize,
    ) -> Result<Self, DecodeError> {
        entries.sort_by_key(|(index, _)| *index);
        for pair in entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(DecodeError::DuplicateSupportIndex { index: pair[0].0 });
            }
        }
        if let Some((index, _)) = entries.last()
            && *index >= vocabulary_size
        {
            return Err(DecodeError::dimension(
                "belief support index bound",
                vocabulary_size,
                *index + 1,
            ));
        }
        for entry in entries.iter_mut() {
            entry.1 = clamp_log(entry.1);
        }
        Ok(Self {
            vocabulary_size,
            support: entries,
        })
    }

    /// Internal constructor for already validated, index-sorted supports.
    pub(crate) fn from_sorted_support(
        support: Vec<(WordIndex, f64)>,
        vocabulary_size: usize,
    ) -> Self {
        debug_assert!(support.windows(2).all(|pair| pair[0].0 < pair[1].0));
        Self {
            vocabulary_size,
            support,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn support_len(&self) -> usize {
        self.support.len()
    }

    pub fn support(&self) -> &[(WordIndex, f64)] {
        &self.support
    }

    pub fn iter(&self) -> impl Iterator<Item = (WordIndex, f64)> + '_ {
        self.support.iter().copied()
    }

    pub fn is_certain(&self) -> bool {
        self.support.len() == 1 && self.support[0].1 == 0.0
    }

    /// Stored log-probability, or [`LOG_ZERO`] outside the support.
    pub fn log_probability_of(&self, index: WordIndex) -> f64 {
        match self.support.binary_search_by_key(&index, |(entry, _)| *entry) {
            Ok(position) => self.support[position].1,
            Err(_) => LOG_ZERO,
        }
    }

    /// Σ exp(log p) over the support; sentinel entries contribute exactly zero.
    pub fn total_mass(&self) -> f64 {
        self.support.iter().map(|(_, log_p)| log_p.exp()).sum()
    }

    /// Most probable index; ties resolve to the lower index.
    pub fn mode(&self) -> Option<WordIndex> {
        let mut best: Option<(WordIndex, f64)> = None;
        for &(index, log_p) in &self.support {
            if best.is_none_or(|(_, best_log_p)| log_p > best_log_p) {
                best = Some((index, log_p));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Shannon entropy in nats over the stored support.
    pub fn entropy(&self) -> f64 {
        self.support
            .iter()
            .filter(|(_, log_p)| !is_log_zero(*log_p))
            .map(|(_, log_p)| -log_p.exp() * log_p)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certain_belief_is_degenerate() {
        let belief = Belief::certain(2, 4);
        assert!(belief.is_certain());
        assert_eq!(belief.support_len(), 1);
        assert_eq!(belief.log_probability_of(2), 0.0);
        assert_eq!(belief.log_probability_of(0), LOG_ZERO);
        assert_eq!(belief.total_mass(), 1.0);
        assert_eq!(belief.entropy(), 0.0);
    }

    #[test]
    fn from_scores_normalizes_to_unit_mass() {
        let belief = Belief::from_scores(&[3.0, 1.0, 0.5, -2.0], 4).expect("valid");
        assert_eq!(belief.support_len(), 4);
        assert!((belief.total_mass() - 1.0).abs() < 1e-12);
        assert_eq!(belief.mode(), Some(0));
    }

    #[test]
    fn from_scores_checks_length_and_mass() {
        assert!(matches!(
            Belief::from_scores(&[0.0, 0.0], 3),
            Err(DecodeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Belief::from_scores(&[LOG_ZERO, LOG_ZERO], 2),
            Err(DecodeError::NoProbabilityMass { .. })
        ));
    }

    #[test]
    fn uniform_beliefs_have_unit_mass() {
        let belief = Belief::uniform(8);
        assert!((belief.total_mass() - 1.0).abs() < 1e-12);
        assert!((belief.entropy() - (8.0f64).ln()).abs() < 1e-12);

        let partial = Belief::uniform_over(&[1, 5, 3], 8).expect("valid");
        assert_eq!(partial.support_len(), 3);
        assert!((partial.total_mass() - 1.0).abs() < 1e-12);
        assert_eq!(partial.log_probability_of(4), LOG_ZERO);
        assert_eq!(partial.mode(), Some(1));
    }

    #[test]
    fn from_entries_validates_support() {
        assert!(matches!(
            Belief::from_entries(vec![(1, -0.1), (1, -2.0)], 4),
            Err(DecodeError::DuplicateSupportIndex { index: 1 })
        ));
        assert!(matches!(
            Belief::from_entries(vec![(7, 0.0)], 4),
            Err(DecodeError::DimensionMismatch { .. })
        ));
        let belief = Belief::from_entries(vec![(3, -0.5), (0, -1.0)], 4).expect("valid");
        assert_eq!(belief.support(), &[(0, -1.0), (3, -0.5)]);
    }

    #[test]
    fn lookup_outside_support_is_sentinel() {
        let belief = Belief::from_entries(vec![(0, -0.2), (2, -1.7)], 5).expect("valid");
        assert_eq!(belief.log_probability_of(2), -1.7);
        assert_eq!(belief.log_probability_of(1), LOG_ZERO);
        assert_eq!(belief.log_probability_of(99), LOG_ZERO);
    }
}
