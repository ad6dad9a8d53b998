use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;

/// Bounded insertion-ordered set gating redundant index writes.
///
/// `cache_item` is linearizable per instance: of any number of concurrent
/// callers with the same key, exactly one observes "newly inserted". An
/// entry present in the cache implies the corresponding index row was at
/// least attempted; callers remove entries when that stops being true.
///
/// Eviction is FIFO by insertion order and may happen at any insert that
/// would exceed capacity. Explicitly removed keys leave a stale order
/// entry behind that is skipped when it surfaces at eviction time.
pub struct DedupCache<K> {
    capacity: usize,
    inner: Mutex<Inner<K>>,
}

struct Inner<K> {
    entries: HashSet<K>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone> DedupCache<K> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: HashSet::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Inserts `key` if absent. Returns `None` when the key was newly
    /// inserted, or a clone of the previously stored key.
    pub fn cache_item(&self, key: K) -> Option<K> {
        let mut inner = self.lock();

        if let Some(prior) = inner.entries.get(&key) {
            return Some(prior.clone());
        }

        while inner.entries.len() >= self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
        }

        inner.order.push_back(key.clone());
        inner.entries.insert(key);
        None
    }

    /// Removes `key` unconditionally.
    pub fn remove(&self, key: &K) {
        self.lock().entries.remove(key);
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

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<K>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
