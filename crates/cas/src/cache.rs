//! Bounded in-memory content cache.
//!
//! A best-effort accelerator in front of the storage backend, never the
//! system of record: a miss means "ask the backend", not "does not exist".
//!
//! Every `put` inserts unconditionally and then runs eviction inline under
//! the same write lock. With the default [`Eviction::ClearAll`] policy, the
//! insert that pushes the size past the threshold empties the whole map,
//! including the entry that was just written.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use serde::Serialize;

use crate::config::{CacheConfig, Eviction};
use crate::id::ContentId;

/// Counters exposed on the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<ContentId, Bytes>,
    /// Insertion order; only maintained under [`Eviction::Oldest`].
    order: VecDeque<ContentId>,
}

#[derive(Debug)]
pub struct ContentCache {
    config: CacheConfig,
    entries: RwLock<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ContentCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: RwLock::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // Cache operations never fail, so a poisoned lock is recovered rather
    // than propagated. Every write leaves the map consistent.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a payload. `None` is a miss, never an error.
    pub fn get(&self, id: &ContentId) -> Option<Bytes> {
        let found = self.read().map.get(id).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert or overwrite, then evict if the cache is over its threshold.
    pub fn put(&self, id: ContentId, payload: Bytes) {
        let evicted = {
            let mut entries = self.write();
            let is_new = entries.map.insert(id.clone(), payload).is_none();
            if is_new && self.config.eviction == Eviction::Oldest {
                entries.order.push_back(id);
            }
            self.evict_locked(&mut entries)
        };
        self.note_evicted(evicted);
    }

    /// Evict per the configured policy if the cache is over its threshold.
    ///
    /// Returns how many entries were dropped. `put` already calls this; it is
    /// public so callers can force a check after changing state by other means.
    pub fn maybe_evict_all(&self) -> usize {
        let evicted = {
            let mut entries = self.write();
            self.evict_locked(&mut entries)
        };
        self.note_evicted(evicted);
        evicted
    }

    fn evict_locked(&self, entries: &mut Entries) -> usize {
        if entries.map.len() <= self.config.threshold {
            return 0;
        }
        match self.config.eviction {
            Eviction::ClearAll => {
                let dropped = entries.map.len();
                entries.map = HashMap::new();
                entries.order.clear();
                dropped
            }
            Eviction::Oldest => {
                let mut dropped = 0;
                while entries.map.len() > self.config.threshold {
                    let Some(oldest) = entries.order.pop_front() else {
                        break;
                    };
                    if entries.map.remove(&oldest).is_some() {
                        dropped += 1;
                    }
                }
                dropped
            }
        }
    }

    fn note_evicted(&self, evicted: usize) {
        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::info!(
                evicted,
                policy = %self.config.eviction,
                threshold = self.config.threshold,
                "cache evicted entries"
            );
        }
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.read().map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut entries = self.write();
        entries.map.clear();
        entries.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn id(n: usize) -> ContentId {
        ContentId::new(format!("bafy{:04}", n)).unwrap()
    }

    #[test]
    fn test_get_after_put_is_exact() {
        let cache = ContentCache::default();
        let payload = Bytes::from_static(b"\x00\x01exact bytes\xff");
        cache.put(id(1), payload.clone());
        assert_eq!(cache.get(&id(1)), Some(payload));
    }

    #[test]
    fn test_miss_is_none() {
        let cache = ContentCache::default();
        assert_eq!(cache.get(&id(7)), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_put_overwrites() {
        let cache = ContentCache::default();
        cache.put(id(1), Bytes::from_static(b"first"));
        cache.put(id(1), Bytes::from_static(b"second"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&id(1)).unwrap(), Bytes::from_static(b"second"));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let cache = ContentCache::default();
        for n in 0..100 {
            cache.put(id(n), Bytes::from_static(b"x"));
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.maybe_evict_all(), 0);
    }

    #[test]
    fn test_101st_insert_clears_everything_including_itself() {
        let cache = ContentCache::default();
        for n in 0..100 {
            cache.put(id(n), Bytes::from_static(b"x"));
        }
        cache.put(id(100), Bytes::from_static(b"trigger"));

        assert!(cache.is_empty());
        assert_eq!(cache.get(&id(100)), None);
        assert_eq!(cache.stats().evictions, 101);
    }

    #[test]
    fn test_cache_refills_after_clear() {
        let cache = ContentCache::new(CacheConfig::default().with_threshold(2));
        for n in 0..3 {
            cache.put(id(n), Bytes::from_static(b"x"));
        }
        assert!(cache.is_empty());
        cache.put(id(3), Bytes::from_static(b"y"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_oldest_policy_keeps_newest() {
        let config = CacheConfig::default()
            .with_threshold(3)
            .with_eviction(Eviction::Oldest);
        let cache = ContentCache::new(config);
        for n in 0..5 {
            cache.put(id(n), Bytes::from(vec![n as u8]));
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&id(0)));
        assert!(!cache.contains(&id(1)));
        assert_eq!(cache.get(&id(4)).unwrap(), Bytes::from(vec![4u8]));
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_oldest_policy_overwrite_keeps_position() {
        let config = CacheConfig::default()
            .with_threshold(2)
            .with_eviction(Eviction::Oldest);
        let cache = ContentCache::new(config);
        cache.put(id(0), Bytes::from_static(b"a"));
        cache.put(id(1), Bytes::from_static(b"b"));
        cache.put(id(0), Bytes::from_static(b"a2"));
        cache.put(id(2), Bytes::from_static(b"c"));

        // id(0) was inserted first, so it goes first even though it was rewritten.
        assert!(!cache.contains(&id(0)));
        assert!(cache.contains(&id(1)));
        assert!(cache.contains(&id(2)));
    }

    #[test]
    fn test_concurrent_puts_both_visible() {
        let cache = Arc::new(ContentCache::default());

        let handles: Vec<_> = (0..2)
            .map(|n| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    cache.put(id(n), Bytes::from(format!("payload-{}", n)));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.get(&id(0)).unwrap(), Bytes::from("payload-0"));
        assert_eq!(cache.get(&id(1)).unwrap(), Bytes::from("payload-1"));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let cache = Arc::new(ContentCache::new(CacheConfig::default().with_threshold(1000)));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for n in 0..50 {
                        let key = id(t * 50 + n);
                        cache.put(key.clone(), Bytes::from_static(b"v"));
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 400);
    }

    #[test]
    fn test_stats_count_hits() {
        let cache = ContentCache::default();
        cache.put(id(1), Bytes::from_static(b"x"));
        cache.get(&id(1));
        cache.get(&id(1));
        cache.get(&id(2));
        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }
}
