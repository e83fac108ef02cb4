//! Small LRU cache of enumerated code spaces keyed by `(slots, code_length)`.

use super::CodeSpace;
use crate::error::DecodeError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeSpaceKey {
    slots: usize,
    code_length: usize,
}

impl CodeSpaceKey {
    pub fn new(slots: usize, code_length: usize) -> Self {
        Self { slots, code_length }
    }
}

/// Stores shared code spaces with an LRU eviction policy.
#[derive(Debug)]
pub struct CodeSpaceCache {
    entries: HashMap<CodeSpaceKey, Arc<CodeSpace>>,
    order: VecDeque<CodeSpaceKey>,
    capacity: usize,
}

impl CodeSpaceCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CodeSpaceKey) -> Option<Arc<CodeSpace>> {
        self.entries.get(key).cloned()
    }

    /// Returns the cached space for `(slots, code_length)`, enumerating it on a miss.
    pub fn get_or_build(
        &mut self,
        slots: usize,
        code_length: usize,
    ) -> Result<Arc<CodeSpace>, DecodeError> {
        let key = CodeSpaceKey::new(slots, code_length);
        if let Some(space) = self.entries.get(&key).cloned() {
            self.touch(key);
            return Ok(space);
        }

        let space = Arc::new(CodeSpace::new(slots, code_length)?);
        self.insert(key, Arc::clone(&space));
        Ok(space)
    }

    fn insert(&mut self, key: CodeSpaceKey, space: Arc<CodeSpace>) {
        if self.capacity == 0 {
            return;
        }
        self.entries.insert(key, space);
        self.touch(key);
        self.evict_if_needed();
    }

    fn touch(&mut self, key: CodeSpaceKey) {
        self.order.retain(|existing| *existing != key);
        self.order.push_back(key);
    }

    fn evict_if_needed(&mut self) {
        while self.capacity > 0 && self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

impl Default for CodeSpaceCache {
    fn default() -> Self {
        Self::new(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_respects_capacity() {
        let mut cache = CodeSpaceCache::new(1);
        cache.get_or_build(4, 3).expect("space a");
        cache.get_or_build(5, 3).expect("space b");
        assert!(cache.get(&CodeSpaceKey::new(4, 3)).is_none());
        assert!(cache.get(&CodeSpaceKey::new(5, 3)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn hits_share_the_same_allocation() {
        let mut cache = CodeSpaceCache::new(2);
        let first = cache.get_or_build(4, 3).expect("space");
        let second = cache.get_or_build(4, 3).expect("space");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn recently_used_entries_survive_eviction() {
        let mut cache = CodeSpaceCache::new(2);
        cache.get_or_build(4, 3).expect("a");
        cache.get_or_build(4, 2).expect("b");
        cache.get_or_build(4, 3).expect("a again");
        cache.get_or_build(5, 2).expect("c");
        assert!(cache.get(&CodeSpaceKey::new(4, 3)).is_some());
        assert!(cache.get(&CodeSpaceKey::new(4, 2)).is_none());
    }

    #[test]
    fn zero_capacity_still_builds() {
        let mut cache = CodeSpaceCache::new(0);
        let space = cache.get_or_build(4, 3).expect("space");
        assert_eq!(space.len(), 24);
        assert!(cache.is_empty());
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache = CodeSpaceCache::new(2);
        assert!(cache.get_or_build(2, 3).is_err());
        assert!(cache.is_empty());
    }
}
