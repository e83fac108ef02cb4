//! Support reduction: keep the most probable prefix covering a target mass.
//!
//! Retained log-probabilities are never renormalized, so a compressed belief only
//! guarantees that its mass is at least the threshold.

use super::Belief;
use crate::error::DecodeError;
use crate::vocab::WordIndex;
use std::cmp::Ordering;

/// Threshold that disables compression.
pub const NO_COMPRESSION: f64 = 1.0;

/// Compresses one belief to the shortest probability-ordered prefix reaching `threshold`.
pub fn compress(belief: &Belief, threshold: f64) -> Result<Belief, DecodeError> {
    validate_threshold(threshold)?;
    if threshold >= NO_COMPRESSION {
        return Ok(belief.clone());
    }
    let ranked = ranked_support(belief);
    let width = prefix_len(&ranked, threshold);
    Ok(retain(belief, ranked, width))
}

/// Compresses a batch to a common support width.
///
/// The width is the largest prefix any member needs, so members that would have
/// stopped earlier keep extra entries and the batch stays rectangular.
pub fn compress_batch(beliefs: &[Belief], threshold: f64) -> Result<Vec<Belief>, DecodeError> {
    validate_threshold(threshold)?;
    if threshold >= NO_COMPRESSION {
        return Ok(beliefs.to_vec());
    }

    let ranked: Vec<Vec<(WordIndex, f64)>> = beliefs.iter().map(ranked_support).collect();
    let width = ranked
        .iter()
        .map(|entries| prefix_len(entries, threshold))
        .max()
        .unwrap_or(0);

    Ok(beliefs
        .iter()
        .zip(ranked)
        .map(|(belief, entries)| retain(belief, entries, width))
        .collect())
}

fn validate_threshold(threshold: f64) -> Result<(), DecodeError> {
    if threshold > 0.0 && threshold <= NO_COMPRESSION {
        Ok(())
    } else {
        Err(DecodeError::InvalidThreshold { threshold })
    }
}

/// Support ordered by decreasing probability, ties by increasing index.
fn ranked_support(belief: &Belief) -> Vec<(WordIndex, f64)> {
    let mut ranked = belief.support().to_vec();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked
}

fn prefix_len(ranked: &[(WordIndex, f64)], threshold: f64) -> usize {
    let mut cumulative = 0.0;
    for (position, (_, log_p)) in ranked.iter().enumerate() {
        cumulative += log_p.exp();
        if cumulative >= threshold {
            return position + 1;
        }
    }
    ranked.len()
}

fn retain(belief: &Belief, mut ranked: Vec<(WordIndex, f64)>, width: usize) -> Belief {
    ranked.truncate(width);
    ranked.sort_by_key(|(index, _)| *index);
    Belief::from_sorted_support(ranked, belief.vocabulary_size())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> Belief {
        let probs: [f64; 5] = [0.05, 0.5, 0.3, 0.1, 0.05];
        let scores: Vec<f64> = probs.iter().map(|p| p.ln()).collect();
        Belief::from_scores(&scores, 5).expect("valid")
    }

    #[test]
    fn keeps_prefix_reaching_threshold() {
        let compressed = compress(&skewed(), 0.75).expect("valid threshold");
        let kept: Vec<WordIndex> = compressed.iter().map(|(index, _)| index).collect();
        assert_eq!(kept, vec![1, 2]);
        assert!(compressed.total_mass() >= 0.75);
        assert_eq!(
            compressed.log_probability_of(2),
            skewed().log_probability_of(2)
        );
    }

    #[test]
    fn default_threshold_is_identity() {
        let belief = skewed();
        assert_eq!(compress(&belief, NO_COMPRESSION).expect("valid"), belief);
    }

    #[test]
    fn idempotent_at_same_or_looser_threshold() {
        let once = compress(&skewed(), 0.85).expect("valid");
        assert_eq!(compress(&once, 0.85).expect("valid"), once);
        assert_eq!(compress(&once, 0.95).expect("valid"), once);
        assert_eq!(compress(&once, 1.0).expect("valid"), once);
    }

    #[test]
    fn ties_resolve_to_lower_index() {
        let belief = Belief::uniform(4);
        let compressed = compress(&belief, 0.45).expect("valid");
        let kept: Vec<WordIndex> = compressed.iter().map(|(index, _)| index).collect();
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn batch_uses_widest_prefix() {
        let narrow = Belief::certain(3, 5);
        let concentrated = Belief::from_entries(
            vec![(0, 0.9f64.ln()), (1, 0.05f64.ln()), (2, 0.05f64.ln())],
            5,
        )
        .expect("valid");
        let batch = compress_batch(&[concentrated, skewed(), narrow], 0.75).expect("valid");
        assert_eq!(batch[0].support_len(), 2);
        assert_eq!(batch[1].support_len(), 2);
        assert_eq!(batch[2].support_len(), 1);
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        for threshold in [0.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                compress(&skewed(), threshold),
                Err(DecodeError::InvalidThreshold { .. })
            ));
        }
    }

    #[test]
    fn inputs_are_not_mutated() {
        let belief = skewed();
        let before = belief.clone();
        let _ = compress(&belief, 0.5).expect("valid");
        assert_eq!(belief, before);
    }
}
