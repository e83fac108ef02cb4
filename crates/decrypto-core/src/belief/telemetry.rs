use super::Belief;
use crate::vocab::WordIndex;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BeliefMetrics {
    pub support_len: usize,
    pub total_mass: f64,
    pub entropy: f64,
    pub mode: Option<WordIndex>,
}

impl BeliefMetrics {
    pub fn from_belief(belief: &Belief) -> Self {
        Self {
            support_len: belief.support_len(),
            total_mass: belief.total_mass(),
            entropy: belief.entropy(),
            mode: belief.mode(),
        }
    }
}

/// Aggregate shape of the beliefs fed to one decode call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchMetrics {
    pub slots: usize,
    pub certain_slots: usize,
    pub max_support: usize,
    pub total_support: usize,
    pub mean_entropy: f64,
}

impl BatchMetrics {
    pub fn from_beliefs(beliefs: &[Belief]) -> Self {
        if beliefs.is_empty() {
            return Self::default();
        }
        let per_slot: Vec<BeliefMetrics> = beliefs.iter().map(BeliefMetrics::from_belief).collect();
        Self {
            slots: beliefs.len(),
            certain_slots: beliefs.iter().filter(|belief| belief.is_certain()).count(),
            max_support: per_slot.iter().map(|m| m.support_len).max().unwrap_or(0),
            total_support: per_slot.iter().map(|m| m.support_len).sum(),
            mean_entropy: per_slot.iter().map(|m| m.entropy).sum::<f64>() / beliefs.len() as f64,
        }
    }
}
