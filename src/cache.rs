//! Cache of joined datasets
//!
//! Keyed by the exact (subject, latitude, longitude) request tuple. Only
//! successful fetches are stored. Readers share a read lock; inserts take the
//! write lock and enforce the [`CachePolicy`].

use crate::config::CachePolicy;
use crate::types::{Coordinates, JoinedDay};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Exact request tuple; coordinates compare bit-for-bit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    subject: String,
    latitude_bits: u64,
    longitude_bits: u64,
}

impl CacheKey {
    pub fn new(subject: &str, coordinates: Coordinates) -> Self {
        Self {
            subject: subject.to_string(),
            latitude_bits: coordinates.latitude.to_bits(),
            longitude_bits: coordinates.longitude.to_bits(),
        }
    }
}

/// Joined days as fetched for one key
#[derive(Debug, Clone)]
pub struct CachedJoin {
    pub days: Vec<JoinedDay>,
    pub fetched_at: DateTime<Utc>,
}

struct Entry {
    value: Arc<CachedJoin>,
    inserted: Instant,
    /// Insertion order, for capacity eviction
    seq: u64,
}

pub struct AnalysisCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    next_seq: AtomicU64,
    policy: CachePolicy,
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl AnalysisCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
            policy,
        }
    }

    /// Cached value for `key`, unless missing or expired
    pub fn get(&self, key: &CacheKey) -> Option<Arc<CachedJoin>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if self.is_expired(entry) {
            debug!(subject = %key.subject, "cache entry expired");
            return None;
        }
        Some(Arc::clone(&entry.value))
    }

    pub fn insert(&self, key: CacheKey, value: CachedJoin) -> Arc<CachedJoin> {
        let value = Arc::new(value);
        let mut entries = self.entries.write();

        entries.retain(|_, e| !self.is_expired(e));

        if let Some(max) = self.policy.max_entries {
            while entries.len() >= max.max(1) && !entries.contains_key(&key) {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.seq)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        debug!(subject = %k.subject, "evicting oldest cache entry");
                        entries.remove(&k);
                    }
                    None => break,
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                inserted: Instant::now(),
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
        value
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.policy
            .ttl()
            .is_some_and(|ttl| entry.inserted.elapsed() >= ttl)
    }
}
