use crate::config::ClueStyle;
use decrypto_core::code::Code;
use decrypto_core::heuristic::SimilarityHeuristic;
use decrypto_core::vocab::WordIndex;
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;

/// Random embedding rows with components in `[-1, 1)`.
pub fn synthetic_embeddings<R: Rng + ?Sized>(
    words: usize,
    dimension: usize,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    (0..words)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect()
}

/// Simulated clue-giver for the team whose keywords are fixed for the game.
#[derive(Debug, Clone)]
pub struct ClueGiver {
    style: ClueStyle,
    keywords: Vec<WordIndex>,
    pools: Vec<Vec<WordIndex>>,
}

impl ClueGiver {
    /// `similarity` supplies the geometry associative clues are drawn from. Each keyword's
    /// pool holds its `pool_size` most similar non-keyword words.
    pub fn new(
        style: ClueStyle,
        keywords: Vec<WordIndex>,
        similarity: &SimilarityHeuristic,
        vocabulary_size: usize,
        pool_size: usize,
    ) -> Self {
        let pools = match style {
            ClueStyle::Literal => Vec::new(),
            ClueStyle::Associative => keywords
                .iter()
                .map(|keyword| {
                    let mut candidates: Vec<(WordIndex, f64)> = (0..vocabulary_size)
                        .filter(|word| !keywords.contains(word))
                        .map(|word| (word, similarity.cosine(word, *keyword)))
                        .collect();
                    candidates.sort_by(|a, b| {
                        b.1.partial_cmp(&a.1)
                            .unwrap_or(Ordering::Equal)
                            .then(a.0.cmp(&b.0))
                    });
                    candidates
                        .into_iter()
                        .take(pool_size)
                        .map(|(word, _)| word)
                        .collect()
                })
                .collect(),
        };
        Self {
            style,
            keywords,
            pools,
        }
    }

    pub fn keywords(&self) -> &[WordIndex] {
        &self.keywords
    }

    /// Neighbour pool for keyword slot `slot` (empty for literal clues).
    pub fn pool(&self, slot: usize) -> &[WordIndex] {
        self.pools.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One clue word per code position, hinting at the keyword in that slot.
    pub fn give<R: Rng + ?Sized>(&self, code: &Code, rng: &mut R) -> Vec<WordIndex> {
        code.slots()
            .iter()
            .map(|slot| {
                let keyword = self.keywords[*slot];
                match self.style {
                    ClueStyle::Literal => keyword,
                    ClueStyle::Associative => {
                        self.pool(*slot).choose(rng).copied().unwrap_or(keyword)
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn geometry() -> SimilarityHeuristic {
        let rows = vec![
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.9, 0.1],
            vec![0.1, 0.9],
            vec![0.7, 0.3],
            vec![-1.0, 0.0],
        ];
        SimilarityHeuristic::new(&rows, 1.0).expect("geometry")
    }

    #[test]
    fn literal_clues_repeat_keywords() {
        let giver = ClueGiver::new(ClueStyle::Literal, vec![4, 1, 0], &geometry(), 6, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let clue = giver.give(&Code::new(vec![2, 0]), &mut rng);
        assert_eq!(clue, vec![0, 4]);
    }

    #[test]
    fn associative_pools_hold_nearest_non_keywords() {
        let giver = ClueGiver::new(ClueStyle::Associative, vec![0, 1], &geometry(), 6, 2);
        assert_eq!(giver.pool(0), &[2, 4]);
        assert_eq!(giver.pool(1), &[3, 4]);

        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..16 {
            let clue = giver.give(&Code::new(vec![1, 0]), &mut rng);
            assert!(giver.pool(1).contains(&clue[0]));
            assert!(giver.pool(0).contains(&clue[1]));
        }
    }

    #[test]
    fn synthetic_embeddings_are_seeded() {
        let mut a = StdRng::seed_from_u64(3);
        let mut b = StdRng::seed_from_u64(3);
        let first = synthetic_embeddings(4, 3, &mut a);
        assert_eq!(first, synthetic_embeddings(4, 3, &mut b));
        assert_eq!(first.len(), 4);
        assert!(first.iter().all(|row| row.len() == 3));
    }
}
