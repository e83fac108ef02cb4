mod heuristic;

pub use heuristic::{HeuristicKind, SharedHeuristic};

use decrypto_core::code::Code;
use decrypto_core::decode::Decoded;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Turns a decoder result into the code a guesser announces.
pub trait GuessPolicy: Send {
    fn choose(&mut self, decoded: &Decoded<'_>) -> Code;

    /// Short label used in structured logs.
    fn label(&self) -> &'static str;
}

/// Always announces the highest-scoring code (first in enumeration order on ties).
#[derive(Debug, Default, Clone, Copy)]
pub struct ArgMaxPolicy;

impl GuessPolicy for ArgMaxPolicy {
    fn choose(&mut self, decoded: &Decoded<'_>) -> Code {
        decoded.best_code()
    }

    fn label(&self) -> &'static str {
        "argmax"
    }
}

/// Draws the announced code from the normalized score distribution.
#[derive(Debug, Clone)]
pub struct SampledPolicy {
    rng: SmallRng,
}

impl SampledPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl GuessPolicy for SampledPolicy {
    fn choose(&mut self, decoded: &Decoded<'_>) -> Code {
        decoded.sample(&mut self.rng)
    }

    fn label(&self) -> &'static str {
        "sampled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decrypto_core::belief::Belief;
    use decrypto_core::code::CodeSpace;
    use decrypto_core::decode::decode;
    use decrypto_core::heuristic::{ExactMatch, ScoreTable};

    #[test]
    fn argmax_matches_best_code() {
        let beliefs: Vec<Belief> = [1, 0, 2, 3].iter().map(|i| Belief::certain(*i, 4)).collect();
        let space = CodeSpace::new(4, 3).expect("space");
        let decoded = decode(&beliefs, &[0, 3, 1], &ExactMatch::new(4), &space).expect("decode");
        assert_eq!(ArgMaxPolicy.choose(&decoded), decoded.best_code());
    }

    #[test]
    fn sampled_policy_is_seed_deterministic() {
        let beliefs: Vec<Belief> = (0..4).map(|_| Belief::uniform(4)).collect();
        let table = ScoreTable::from_fn(4, |clue, keyword| -((clue * keyword) as f64) / 8.0);
        let space = CodeSpace::new(4, 2).expect("space");
        let decoded = decode(&beliefs, &[1, 2], &table, &space).expect("decode");

        let mut first = SampledPolicy::new(11);
        let mut second = SampledPolicy::new(11);
        for _ in 0..8 {
            assert_eq!(first.choose(&decoded), second.choose(&decoded));
        }
    }
}
