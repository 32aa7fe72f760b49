use crate::common::FrameResult;
use crate::pipeline::services::preprocessing::Fingerprint;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Fingerprint, FrameResult>,
    /// Keys in insertion order; the front is evicted first.
    order: VecDeque<Fingerprint>,
}

/// Bounded fingerprint → result store with first-in first-out eviction.
///
/// Overwriting a key replaces its value but keeps its place in the eviction
/// order. Reads never reorder entries. A single mutex guards the whole store;
/// every operation is O(1).
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl ResultCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<FrameResult> {
        self.lock().entries.get(fingerprint).cloned()
    }

    pub fn put(&self, fingerprint: Fingerprint, result: FrameResult) {
        let mut state = self.lock();
        if let Some(existing) = state.entries.get_mut(&fingerprint) {
            *existing = result;
            return;
        }

        if state.entries.len() >= self.capacity {
            if let Some(oldest) = state.order.pop_front() {
                state.entries.remove(&oldest);
                debug!("Evicted cached result {}", oldest);
            }
        }
        state.order.push_back(fingerprint);
        state.entries.insert(fingerprint, result);
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().entries.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{BoundingBox, Detection};
    use crate::pipeline::services::preprocessing::FingerprintHasher;
    use std::sync::Arc;

    fn key(n: usize) -> Fingerprint {
        FingerprintHasher::full_payload().fingerprint(&format!("frame-{n}"))
    }

    fn result(tag: i64) -> FrameResult {
        FrameResult {
            detections: vec![Detection::Object {
                label: "person".to_string(),
                category: 0,
                confidence: 0.9,
                bbox: BoundingBox::new(0, 0, 4, 4),
            }],
            processing_time: 0.125,
            timestamp: tag,
        }
    }

    #[test]
    fn oldest_insert_is_evicted_first() {
        let capacity = 4;
        let cache = ResultCache::new(capacity);
        for n in 1..=capacity + 1 {
            cache.put(key(n), result(n as i64));
        }
        assert_eq!(cache.len(), capacity);
        assert!(!cache.contains(&key(1)));
        for n in 2..=capacity + 1 {
            assert!(cache.contains(&key(n)), "K{n} should survive");
        }
    }

    #[test]
    fn reads_do_not_refresh_eviction_order() {
        let cache = ResultCache::new(2);
        cache.put(key(1), result(1));
        cache.put(key(2), result(2));
        assert!(cache.get(&key(1)).is_some());
        cache.put(key(3), result(3));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
    }

    #[test]
    fn overwrite_keeps_position_and_slot_count() {
        let cache = ResultCache::new(2);
        cache.put(key(1), result(1));
        cache.put(key(2), result(2));
        cache.put(key(1), result(10));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&key(1)).unwrap().timestamp, 10);

        cache.put(key(3), result(3));
        assert!(!cache.contains(&key(1)));
        assert!(cache.contains(&key(2)));
        assert!(cache.contains(&key(3)));
    }

    #[test]
    fn hits_return_the_stored_value_unchanged() {
        let cache = ResultCache::new(8);
        let stored = result(42);
        cache.put(key(1), stored.clone());
        let first = cache.get(&key(1)).unwrap();
        let second = cache.get(&key(1)).unwrap();
        assert_eq!(first, stored);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let cache = ResultCache::new(0);
        cache.put(key(1), result(1));
        cache.put(key(2), result(2));
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(2)));
    }

    #[test]
    fn concurrent_writers_never_exceed_capacity() {
        let cache = Arc::new(ResultCache::new(16));
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for n in 0..100 {
                        cache.put(key(worker * 1000 + n), result(n as i64));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 16);
    }
}
