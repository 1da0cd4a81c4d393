//! In-memory result cache with a time-to-live and a capacity bound.
//!
//! Entries are evicted oldest-first when the cache is full; expired entries
//! are dropped when they are looked up or when room is needed.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::gateway::ContentType;
use crate::i18n::Language;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    source: Language,
    target: Language,
    content_type: ContentType,
}

impl CacheKey {
    /// Build a key; whitespace differences do not produce distinct keys.
    pub fn new(text: &str, source: Language, target: Language, content_type: ContentType) -> Self {
        Self {
            text: text.split_whitespace().collect::<Vec<_>>().join(" "),
            source,
            target,
            content_type,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
}

#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    order: VecDeque<CacheKey>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct TranslationCache<V> {
    state: Mutex<CacheState<V>>,
    ttl: Duration,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> TranslationCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            ttl,
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut state = self.lock();
        let expired = match state.entries.get(key) {
            Some(entry) if entry.created_at.elapsed() <= self.ttl => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.remove(key);
            state.order.retain(|k| k != key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: CacheKey, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();
        if state.entries.contains_key(&key) {
            state.order.retain(|k| k != &key);
        } else {
            self.purge_expired(&mut state);
            while state.entries.len() >= self.capacity {
                let Some(oldest) = state.order.pop_front() else { break };
                state.entries.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        state.order.push_back(key.clone());
        state.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
        self.insertions.fetch_add(1, Ordering::Relaxed);
    }

    fn purge_expired(&self, state: &mut CacheState<V>) {
        let ttl = self.ttl;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.created_at.elapsed() <= ttl);
        let CacheState { entries, order } = state;
        order.retain(|k| entries.contains_key(k));
        let purged = before - state.entries.len();
        self.evictions.fetch_add(purged as u64, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
