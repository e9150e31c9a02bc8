//! Bounded asset cache
//!
//! Memoizes `key -> Arc<Asset>` under a [`CachePolicy`]. Concurrent misses on
//! the same key share one load: the first caller runs the loader while the
//! others wait on the same [`OnceCell`] and observe its result. Absent results
//! are handed to every waiter but never stored.
//!
//! Bounds are enforced synchronously on insert, so `entry_count()` never
//! exceeds `max_entries` and `weighted_size()` never exceeds `max_weight`
//! once an insert returns. Eviction order is least recently used.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::spec::{BoundedPolicy, CachePolicy};
use crate::asset::Asset;

/// Result cell shared by every caller waiting on one load
type Flight = Arc<OnceCell<Option<Arc<Asset>>>>;

struct Entry {
    asset: Arc<Asset>,
    weight: u64,
    written: Instant,
    accessed: Instant,
}

impl Entry {
    fn is_expired(&self, policy: &BoundedPolicy, now: Instant) -> bool {
        policy
            .expire_after_write
            .is_some_and(|ttl| now.duration_since(self.written) >= ttl)
            || policy
                .expire_after_access
                .is_some_and(|tti| now.duration_since(self.accessed) >= tti)
    }
}

struct Store {
    entries: LruCache<String, Entry>,
    weight: u64,
}

impl Store {
    fn remove(&mut self, key: &str) -> Option<Entry> {
        let entry = self.entries.pop(key)?;
        self.weight -= entry.weight;
        Some(entry)
    }

    fn pop_lru(&mut self) -> Option<Entry> {
        let (_, entry) = self.entries.pop_lru()?;
        self.weight -= entry.weight;
        Some(entry)
    }

    fn over_capacity(&self, policy: &BoundedPolicy) -> bool {
        policy
            .max_entries
            .is_some_and(|max| self.entries.len() as u64 > max)
            || policy.max_weight.is_some_and(|max| self.weight > max)
    }
}

/// Releases a key's in-flight slot when its loader completes or is dropped
///
/// A cancelled loader leaves the slot in place while other callers still
/// hold it; one of them takes the load over and releases it later.
struct FlightSlot<'a> {
    in_flight: &'a Mutex<HashMap<String, Flight>>,
    key: &'a str,
    flight: &'a Flight,
    finished: bool,
}

impl Drop for FlightSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.get(self.key).is_some_and(|f| Arc::ptr_eq(f, self.flight)) {
            return;
        }
        // Held by the map and the loading caller only
        if self.finished || Arc::strong_count(self.flight) <= 2 {
            in_flight.remove(self.key);
        }
    }
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Loader invocations that produced an asset
    pub loads: u64,
    /// Loader invocations that produced nothing
    pub load_failures: u64,
    /// Entries dropped for size, weight or expiry
    pub evictions: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_load(&self, loaded: bool) {
        if loaded {
            Self::bump(&self.loads);
        } else {
            Self::bump(&self.load_failures);
        }
    }
}

/// Thread-safe memoizing cache for resolved assets
pub struct AssetCache {
    policy: CachePolicy,
    store: Mutex<Store>,
    in_flight: Mutex<HashMap<String, Flight>>,
    counters: Counters,
}

impl AssetCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            store: Mutex::new(Store {
                entries: LruCache::unbounded(),
                weight: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Return the cached asset for `key`, running `load` on a miss
    ///
    /// With caching disabled `load` runs on every call. Otherwise at most one
    /// `load` per key is in progress at any moment; callers arriving meanwhile
    /// wait for it and receive the same result.
    pub async fn get_with<F, Fut>(&self, key: &str, load: F) -> Option<Arc<Asset>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<Asset>>,
    {
        let CachePolicy::Bounded(policy) = self.policy else {
            Counters::bump(&self.counters.misses);
            let asset = load().await;
            self.counters.record_load(asset.is_some());
            return asset.map(Arc::new);
        };

        let flight = {
            let mut in_flight = self.in_flight.lock();
            if let Some(asset) = self.get_present(key, &policy) {
                Counters::bump(&self.counters.hits);
                return Some(asset);
            }
            Counters::bump(&self.counters.misses);
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };

        flight
            .get_or_init(|| {
                let mut slot = FlightSlot {
                    in_flight: &self.in_flight,
                    key,
                    flight: &flight,
                    finished: false,
                };
                let pending = load();
                async move {
                    let asset = pending.await.map(Arc::new);
                    self.counters.record_load(asset.is_some());
                    if let Some(asset) = &asset {
                        self.insert(key, Arc::clone(asset), &policy);
                    }
                    slot.finished = true;
                    asset
                }
            })
            .await
            .clone()
    }

    /// Look up a live entry, refreshing its recency and access time
    fn get_present(&self, key: &str, policy: &BoundedPolicy) -> Option<Arc<Asset>> {
        let now = Instant::now();
        let mut guard = self.store.lock();
        let store = &mut *guard;

        match store.entries.get_mut(key) {
            None => return None,
            Some(entry) if !entry.is_expired(policy, now) => {
                entry.accessed = now;
                return Some(Arc::clone(&entry.asset));
            }
            Some(_) => {}
        }

        store.remove(key);
        Counters::bump(&self.counters.evictions);
        None
    }

    fn insert(&self, key: &str, asset: Arc<Asset>, policy: &BoundedPolicy) {
        let now = Instant::now();
        let weight = u64::try_from(asset.len()).unwrap_or(u64::MAX);
        let mut guard = self.store.lock();
        let store = &mut *guard;

        let entry = Entry {
            asset,
            weight,
            written: now,
            accessed: now,
        };
        if let Some(previous) = store.entries.put(key.to_string(), entry) {
            store.weight -= previous.weight;
        }
        store.weight += weight;

        while store
            .entries
            .peek_lru()
            .is_some_and(|(_, e)| e.is_expired(policy, now))
        {
            store.pop_lru();
            Counters::bump(&self.counters.evictions);
        }
        while store.over_capacity(policy) && store.pop_lru().is_some() {
            Counters::bump(&self.counters.evictions);
        }
    }

    /// Drop the entry for `key`, if any
    pub fn invalidate(&self, key: &str) {
        self.store.lock().remove(key);
    }

    /// Drop every entry
    pub fn invalidate_all(&self) {
        let mut store = self.store.lock();
        store.entries.clear();
        store.weight = 0;
    }

    pub fn entry_count(&self) -> usize {
        self.store.lock().entries.len()
    }

    /// Sum of the byte sizes of all cached assets
    pub fn weighted_size(&self) -> u64 {
        self.store.lock().weight
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}
