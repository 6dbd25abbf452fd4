//! Fixed-capacity LRU cache with `get_or_create` semantics.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::hash::Hash;

struct LruInner<K, V> {
    capacity: usize,
    values: HashMap<K, V>,
    /// Usage order, most recent first.
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruInner<K, V> {
    fn touch(&mut self, key: &K) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
        }
        self.order.push_front(key.clone());
    }
}

/// Least-recently-used cache with a fixed entry capacity.
///
/// `get_or_create` runs the producer on a miss, the touched entry becomes
/// most-recent, and the least-recent entry is evicted once the capacity is
/// exceeded. All access is serialised under an internal mutex; the producer
/// runs inside the critical section, so concurrent callers for the same key
/// compute the value once.
pub struct LruMemoryCache<K, V> {
    inner: Mutex<LruInner<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruMemoryCache<K, V> {
    /// A cache holding at most `capacity` entries. A zero capacity is treated
    /// as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruInner {
                capacity: capacity.max(1),
                values: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// The value for `key`, producing and caching it on a miss.
    pub fn get_or_create(&self, key: K, producer: impl FnOnce(&K) -> V) -> V {
        let mut inner = self.inner.lock();
        if let Some(value) = inner.values.get(&key) {
            let value = value.clone();
            inner.touch(&key);
            return value;
        }
        let value = producer(&key);
        inner.values.insert(key.clone(), value.clone());
        inner.touch(&key);
        if inner.values.len() > inner.capacity {
            if let Some(evicted) = inner.order.pop_back() {
                inner.values.remove(&evicted);
            }
        }
        value
    }

    pub fn len(&self) -> usize {
        self.inner.lock().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is currently cached (does not touch the entry).
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().values.contains_key(key)
    }
}
