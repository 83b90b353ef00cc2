//! Bounded lookup cache with approximate least-recently-used eviction.
//!
//! Readers share the `RwLock`; recency is tracked with per-slot atomic stamps
//! so a hit never needs the write lock. Eviction scans for the oldest stamp,
//! which is linear in the capacity and only runs when inserting into a full
//! cache.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

#[derive(Debug)]
struct Slot<V> {
    value: V,
    resolved_at: Instant,
    last_used: AtomicU64,
}

/// Hit and miss counters for one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to reach the directory.
    pub misses: u64,
    /// Entries currently held.
    pub entries: usize,
}

#[derive(Debug)]
pub(crate) struct BoundedCache<K, V> {
    capacity: usize,
    ttl: Option<Duration>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    slots: RwLock<FxHashMap<K, Slot<V>>>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Copy,
    V: Clone,
{
    pub(crate) fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            capacity,
            ttl,
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            slots: RwLock::new(FxHashMap::default()),
        }
    }

    fn is_fresh(&self, slot: &Slot<V>) -> bool {
        self.ttl.is_none_or(|ttl| slot.resolved_at.elapsed() < ttl)
    }

    pub(crate) fn get(&self, key: &K) -> Option<V> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        match slots.get(key).filter(|slot| self.is_fresh(slot)) {
            Some(slot) => {
                let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
                slot.last_used.store(stamp, Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(slot.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub(crate) fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);

        if slots.len() >= self.capacity && !slots.contains_key(&key) {
            if let Some(ttl) = self.ttl {
                slots.retain(|_, slot| slot.resolved_at.elapsed() < ttl);
            }
            if slots.len() >= self.capacity {
                let oldest = slots
                    .iter()
                    .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                    .map(|(key, _)| *key);
                if let Some(oldest) = oldest {
                    slots.remove(&oldest);
                }
            }
        }

        let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
        slots.insert(
            key,
            Slot {
                value,
                resolved_at: Instant::now(),
                last_used: AtomicU64::new(stamp),
            },
        );
    }

    pub(crate) fn clear(&self) {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.slots.read().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }
}
