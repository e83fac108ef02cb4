use super::Heuristic;
use crate::error::DecodeError;
use crate::logspace::{clamp_log, log_sum_exp};
use crate::vocab::WordIndex;

/// Embedding-similarity heuristic.
///
/// Models a clue-giver holding keyword `k` who picks clue `c` with probability
/// `softmax_c(cos(c, k) / temperature)`. Rows are unit-normalized at construction and
/// the per-keyword softmax normalizers are cached, so scoring is one dot product.
#[derive(Debug, Clone)]
pub struct SimilarityHeuristic {
    dimension: usize,
    temperature: f64,
    unit_rows: Vec<f64>,
    log_normalizers: Vec<f64>,
}

impl SimilarityHeuristic {
    pub fn new(embeddings: &[Vec<f32>], temperature: f64) -> Result<Self, DecodeError> {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(DecodeError::InvalidTemperature { temperature });
        }
        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        let mut unit_rows = Vec::with_capacity(embeddings.len() * dimension);
        for row in embeddings {
            if row.len() != dimension {
                return Err(DecodeError::dimension(
                    "embedding dimension",
                    dimension,
                    row.len(),
                ));
            }
            let norm = row
                .iter()
                .map(|value| f64::from(*value).powi(2))
                .sum::<f64>()
                .sqrt();
            // A zero row has no direction; it stays zero and scores cos = 0 against all.
            let scale = if norm > 0.0 { norm.recip() } else { 0.0 };
            unit_rows.extend(row.iter().map(|value| f64::from(*value) * scale));
        }

        let mut heuristic = Self {
            dimension,
            temperature,
            unit_rows,
            log_normalizers: Vec::new(),
        };
        let domain = embeddings.len();
        let mut logits = vec![0.0; domain];
        let mut normalizers = Vec::with_capacity(domain);
        for keyword in 0..domain {
            for (clue, logit) in logits.iter_mut().enumerate() {
                *logit = heuristic.logit(clue, keyword);
            }
            normalizers.push(log_sum_exp(&logits));
        }
        heuristic.log_normalizers = normalizers;
        Ok(heuristic)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Cosine similarity between two words.
    pub fn cosine(&self, a: WordIndex, b: WordIndex) -> f64 {
        self.row(a)
            .iter()
            .zip(self.row(b))
            .map(|(x, y)| x * y)
            .sum()
    }

    /// Log-probabilities of every clue for `keyword`, indexed by clue.
    pub fn clue_log_probs(&self, keyword: WordIndex) -> Vec<f64> {
        (0..self.domain_size())
            .map(|clue| self.score(clue, keyword))
            .collect()
    }

    fn logit(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        self.cosine(clue, keyword) / self.temperature
    }

    fn row(&self, index: WordIndex) -> &[f64] {
        let start = index * self.dimension;
        &self.unit_rows[start..start + self.dimension]
    }
}

impl Heuristic for SimilarityHeuristic {
    fn domain_size(&self) -> usize {
        self.log_normalizers.len()
    }

    fn score(&self, clue: WordIndex, keyword: WordIndex) -> f64 {
        clamp_log(self.logit(clue, keyword) - self.log_normalizers[keyword])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeddings() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.9, 0.1, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 2.0],
        ]
    }

    #[test]
    fn scores_form_a_distribution_over_clues() {
        let heuristic = SimilarityHeuristic::new(&embeddings(), 0.5).expect("valid");
        assert_eq!(heuristic.domain_size(), 4);
        for keyword in 0..4 {
            let mass: f64 = heuristic
                .clue_log_probs(keyword)
                .iter()
                .map(|lp| lp.exp())
                .sum();
            assert!((mass - 1.0).abs() < 1e-9, "keyword {keyword} mass {mass}");
        }
    }

    #[test]
    fn similar_words_score_higher() {
        let heuristic = SimilarityHeuristic::new(&embeddings(), 0.2).expect("valid");
        assert!(heuristic.score(1, 0) > heuristic.score(2, 0));
        assert!(heuristic.score(1, 0) > heuristic.score(3, 0));
        assert!((heuristic.cosine(3, 3) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_temperature() {
        for temperature in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SimilarityHeuristic::new(&embeddings(), temperature),
                Err(DecodeError::InvalidTemperature { .. })
            ));
        }
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut rows = embeddings();
        rows[2].push(1.0);
        let err = SimilarityHeuristic::new(&rows, 1.0).expect_err("ragged");
        assert!(matches!(
            err,
            DecodeError::DimensionMismatch {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }
}
