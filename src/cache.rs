use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted: Instant,
    seq: u64,
}

/// A map whose entries expire a fixed time after insertion.
///
/// Expiry is lazy: reads skip stale entries and the next `insert` drops them.
/// `keys` yields live keys in insertion order, though callers should not
/// depend on that.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(&self, entry: &Entry<V>) -> bool {
        entry.inserted.elapsed() < self.ttl
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .filter(|entry| self.is_live(entry))
            .map(|entry| &entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Insert or replace `key`, restarting its time-to-live.
    pub fn insert(&mut self, key: K, value: V) {
        self.purge();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            Entry {
                value,
                inserted: Instant::now(),
                seq,
            },
        );
    }

    /// Live keys, oldest insertion first.
    pub fn keys(&self) -> Vec<K> {
        let mut live: Vec<(&K, u64)> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_live(entry))
            .map(|(key, entry)| (key, entry.seq))
            .collect();
        live.sort_by_key(|(_, seq)| *seq);
        live.into_iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| self.is_live(e)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted.elapsed() < ttl);
    }
}
