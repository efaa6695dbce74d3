//! Per-location result cache with two invalidation granularities.
//!
//! A daily tick invalidates everything at once through a single global flag;
//! a repair invalidates one parcel. Tracking keys individually while the
//! global flag is up would be redundant, so the individual set is dropped
//! whenever the global flag is raised.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::spatial::LocationKey;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub updated_at: DateTime<Utc>,
    pub payload: T,
    pub dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub invalidations: u64,
    pub global_invalidations: u64,
}

pub struct ResultCache<T> {
    name: &'static str,
    entries: HashMap<LocationKey, CacheEntry<T>>,
    all_stale: bool,
    stale_keys: HashSet<LocationKey>,
    hits: u64,
    misses: u64,
    invalidations: u64,
    global_invalidations: u64,
}

impl<T> ResultCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: HashMap::new(),
            all_stale: false,
            stale_keys: HashSet::new(),
            hits: 0,
            misses: 0,
            invalidations: 0,
            global_invalidations: 0,
        }
    }

    /// Returns the entry only if it is clean. Every call counts as a hit or a miss.
    pub fn get(&mut self, key: LocationKey) -> Option<&CacheEntry<T>> {
        match self.entries.get(&key) {
            Some(entry) if !entry.dirty => {
                self.hits += 1;
                Some(entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores a freshly computed payload; the entry is clean afterwards.
    pub fn set(&mut self, key: LocationKey, payload: T) {
        self.stale_keys.remove(&key);
        self.entries.insert(
            key,
            CacheEntry {
                updated_at: Utc::now(),
                payload,
                dirty: false,
            },
        );
    }

    pub fn mark_all_stale(&mut self, reason: &str) {
        log::trace!("{} cache: all entries stale ({reason})", self.name);
        self.all_stale = true;
        self.stale_keys.clear();
        for entry in self.entries.values_mut() {
            entry.dirty = true;
        }
        self.global_invalidations += 1;
    }

    pub fn mark_stale(&mut self, key: LocationKey, reason: &str) {
        self.invalidations += 1;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.dirty = true;
        }
        if self.all_stale {
            return;
        }
        log::trace!("{} cache: {key} stale ({reason})", self.name);
        self.stale_keys.insert(key);
    }

    pub fn is_stale(&self, key: LocationKey) -> bool {
        self.all_stale || self.stale_keys.contains(&key)
    }

    pub fn is_globally_stale(&self) -> bool {
        self.all_stale
    }

    /// Resets both staleness mechanisms after a full batch recompute.
    pub fn clear_stale_flags(&mut self) {
        self.all_stale = false;
        self.stale_keys.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            hit_rate: if lookups > 0 {
                self.hits as f64 / lookups as f64
            } else {
                0.0
            },
            invalidations: self.invalidations,
            global_invalidations: self.global_invalidations,
        }
    }
}
