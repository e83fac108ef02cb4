//! Posterior updates once a round reveals which slot a clue was given for.

use super::Belief;
use crate::error::DecodeError;
use crate::heuristic::Heuristic;
use crate::logspace::{is_live_term, is_log_zero, log_sum_exp_live};
use crate::vocab::WordIndex;

impl Belief {
    /// Returns the posterior after observing `clue` for this slot.
    ///
    /// `log B'(k) = log B(k) + score(clue, k) - log Z`. Entries whose prior or score
    /// is the sentinel, or whose posterior falls to it, leave the support. The prior
    /// is left untouched.
    pub fn observe<H: Heuristic + ?Sized>(
        &self,
        clue: WordIndex,
        heuristic: &H,
    ) -> Result<Belief, DecodeError> {
        let domain = heuristic.domain_size();
        if self.vocabulary_size() != domain {
            return Err(DecodeError::dimension(
                "belief vocabulary vs heuristic domain",
                domain,
                self.vocabulary_size(),
            ));
        }
        if clue >= domain {
            return Err(DecodeError::dimension("clue index bound", domain, clue + 1));
        }

        let mut joint = Vec::with_capacity(self.support_len());
        for (keyword, log_p) in self.iter() {
            if keyword >= domain {
                return Err(DecodeError::dimension(
                    "belief support index bound",
                    domain,
                    keyword + 1,
                ));
            }
            let score = heuristic.score(clue, keyword);
            if is_live_term(log_p, score) {
                joint.push((keyword, log_p + score));
            }
        }
        if joint.is_empty() {
            return Err(DecodeError::NoProbabilityMass {
                context: "belief update",
            });
        }

        let terms: Vec<f64> = joint.iter().map(|(_, term)| *term).collect();
        let log_evidence = log_sum_exp_live(&terms);
        let support = joint
            .into_iter()
            .map(|(keyword, term)| (keyword, term - log_evidence))
            .filter(|(_, log_p)| !is_log_zero(*log_p))
            .collect();
        Ok(Belief::from_sorted_support(support, domain))
    }
}
