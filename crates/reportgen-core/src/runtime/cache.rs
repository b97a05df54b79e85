//! Bounded step cache.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A bounded map that evicts the oldest inserted entry when full.
///
/// Reads do not refresh an entry's position: eviction order is insertion
/// order, not access order.
#[derive(Debug, Clone)]
pub struct StepCache<K, V> {
    capacity: usize,
    order: VecDeque<K>,
    entries: HashMap<K, V>,
}

impl<K: Eq + Hash + Clone, V> StepCache<K, V> {
    /// Creates an empty cache. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            entries: HashMap::with_capacity(capacity),
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

    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Inserts `value` under `key` and returns the evicted key, if any.
    ///
    /// Replacing an existing key keeps its original insertion position.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }

        let mut evicted = None;
        if self.entries.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.entries.remove(&oldest);
            evicted = Some(oldest);
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        evicted
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_inserted() {
        let mut cache = StepCache::new(3);
        for key in 1..=3 {
            assert_eq!(cache.put(key, key * 10), None);
        }
        assert_eq!(cache.put(4, 40), Some(1));

        assert_eq!(cache.len(), 3);
        assert!(!cache.has(&1));
        assert_eq!(cache.keys().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_reads_do_not_refresh_position() {
        let mut cache = StepCache::new(2);
        cache.put("a", 1);
        cache.put("b", 2);
        assert_eq!(cache.get(&"a"), Some(&1));

        assert_eq!(cache.put("c", 3), Some("a"));
        assert!(cache.has(&"b"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut cache = StepCache::new(2);
        cache.put(1, "old");
        cache.put(2, "x");
        assert_eq!(cache.put(1, "new"), None);
        assert_eq!(cache.get(&1), Some(&"new"));

        assert_eq!(cache.put(3, "y"), Some(1));
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut cache = StepCache::new(3);
        for key in 0..100 {
            cache.put(key, ());
            assert!(cache.len() <= cache.capacity());
        }
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut cache = StepCache::new(0);
        cache.put(1, ());
        assert_eq!(cache.capacity(), 1);
        assert!(cache.has(&1));
    }
}
