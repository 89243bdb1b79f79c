//! Bounded least-recently-used memo shared by the verification components.
//!
//! Lookups, inserts and the eviction an insert triggers all happen under one
//! lock, so concurrent callers never lose updates or grow it past capacity.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

pub struct ResultCache<V> {
    capacity: usize,
    state: Mutex<CacheState<V>>,
}

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    clock: u64,
}

struct CacheEntry<V> {
    value: V,
    last_access: u64,
}

impl<V> CacheState<V> {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                clock: 0,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState<V>> {
        // A panic mid-insert leaves the map consistent, so poisoning is ignored.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state();
        let now = state.tick();
        let entry = state.entries.get_mut(key)?;
        entry.last_access = now;
        debug!(key = truncate_key(key), "Cache hit");
        Some(entry.value.clone())
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut state = self.state();
        let now = state.tick();

        if !state.entries.contains_key(&key) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_access)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                debug!(key = truncate_key(&oldest), "Cache evicted least recently used");
            }
        }

        state.entries.insert(
            key,
            CacheEntry {
                value,
                last_access: now,
            },
        );
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.state().entries.clear();
    }
}

impl<V: Clone> Default for ResultCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

fn truncate_key(key: &str) -> &str {
    crate::text::truncate_to_char_boundary(key, 50)
}
