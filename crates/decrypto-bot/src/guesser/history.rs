use decrypto_core::belief::Belief;

/// Beliefs each slot held before every accepted reveal, oldest first.
#[derive(Debug, Clone, Default)]
pub struct BeliefHistory {
    slots: Vec<Vec<Belief>>,
}

impl BeliefHistory {
    pub fn new(slots: usize) -> Self {
        Self {
            slots: vec![Vec::new(); slots],
        }
    }

    pub(super) fn record(&mut self, slot: usize, prior: Belief) {
        if let Some(entries) = self.slots.get_mut(slot) {
            entries.push(prior);
        }
    }

    /// Replaced beliefs for `slot`; empty for slots never updated or out of range.
    pub fn replaced(&self, slot: usize) -> &[Belief] {
        self.slots.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn updates(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_per_slot() {
        let mut history = BeliefHistory::new(2);
        history.record(1, Belief::uniform(3));
        history.record(1, Belief::certain(0, 3));
        history.record(5, Belief::uniform(3));
        assert!(history.replaced(0).is_empty());
        assert_eq!(history.replaced(1).len(), 2);
        assert!(history.replaced(9).is_empty());
        assert_eq!(history.updates(), 2);
    }
}
