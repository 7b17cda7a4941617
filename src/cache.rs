//! In-memory TTL cache for diagnosis results.
//!
//! Read-through before the pipeline runs, write-on-success-only after it.
//! Entries expire after a fixed TTL and expired entries behave as absent, so
//! a failed run is retried in full on the next request. Concurrent get/set
//! from in-flight requests is safe; the cache is constructed and injected,
//! never ambient.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// TTL cache over cloneable values.
pub struct TtlCache<T: Clone> {
    entries: DashMap<String, Entry<T>>,
    ttl: Duration,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Get a fresh value. Expired entries are dropped and treated as absent.
    pub fn get(&self, key: &str) -> Option<T> {
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store a value with the fixed TTL. Never called for failed runs.
    pub fn set(&self, key: &str, value: T) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop all expired entries.
    pub fn purge_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cache key for a place diagnosis.
pub fn place_key(place_id: &str) -> String {
    format!("place:{place_id}")
}

/// Cache key for a social diagnosis. Handles are normalized so `@Cafe` and
/// `cafe` share an entry.
pub fn social_key(handle: &str) -> String {
    format!("social:{}", handle.trim().trim_start_matches('@').to_lowercase())
}
