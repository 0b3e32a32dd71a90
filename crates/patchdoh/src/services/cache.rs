//! A generic, size-bounded cache with per-entry TTL.
//!
//! Used both for DNS answers (keyed by [`crate::models::dns::CacheKey`]) and
//! for CDN-classification memoization (keyed by IP address string). Every
//! operation is synchronous and bounded — never a suspension point — so a
//! blocking [`std::sync::Mutex`] is the right tool rather than an async lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A monotonic clock, injected so expiry can be driven deterministically in
/// tests instead of sleeping on the real wall clock.
pub type Timer = Arc<dyn Fn() -> Instant + Send + Sync>;

struct Entry<V> {
    expire: Instant,
    value: V,
}

/// A `K -> V` map where every entry expires after a TTL and the map never
/// grows past `max_size`.
///
/// Eviction triggers whenever an insert pushes the map above `max_size`: the
/// `over = len - max_size` entries with the smallest `expire` are removed.
/// Already-expired entries necessarily have the smallest `expire`, so this
/// single rule both reaps expired entries and enforces the size bound.
pub struct TtlCache<K, V> {
    storage: Mutex<HashMap<K, Entry<V>>>,
    max_size: usize,
    max_ttl: Duration,
    timer: Timer,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache holding at most `max_size` entries, each with
    /// a TTL capped at `max_ttl`, driven by the real monotonic clock.
    pub fn new(max_size: usize, max_ttl: Duration) -> Self {
        Self::with_timer(max_size, max_ttl, Arc::new(Instant::now))
    }

    /// Creates a cache driven by an injected `timer` instead of
    /// `Instant::now`, so tests can advance time without sleeping.
    pub fn with_timer(max_size: usize, max_ttl: Duration, timer: Timer) -> Self {
        Self {
            storage: Mutex::new(HashMap::new()),
            max_size,
            max_ttl,
            timer,
        }
    }

    /// Returns a fresh value for `key`, or `None` if absent or expired.
    ///
    /// A found-but-expired entry is removed as a side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = (self.timer)();
        let mut storage = self.storage.lock().expect("cache mutex poisoned");
        match storage.get(key) {
            Some(entry) if entry.expire > now => Some(entry.value.clone()),
            Some(_) => {
                storage.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key` with `ttl` (capped at `max_ttl`; defaults
    /// to `max_ttl` when `None`). Triggers eviction if this insert pushes
    /// the cache above `max_size`.
    pub fn store(&self, key: K, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.max_ttl).min(self.max_ttl);
        let expire = (self.timer)() + ttl;

        let mut storage = self.storage.lock().expect("cache mutex poisoned");
        storage.insert(key, Entry { expire, value });
        if storage.len() > self.max_size {
            Self::evict(&mut storage, self.max_size);
        }
    }

    /// Removes `key` unconditionally. A no-op if absent.
    pub fn delete(&self, key: &K) {
        self.storage.lock().expect("cache mutex poisoned").remove(key);
    }

    /// Number of entries currently stored, including any not yet reaped.
    pub fn len(&self) -> usize {
        self.storage.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(storage: &mut HashMap<K, Entry<V>>, max_size: usize) {
        let over = storage.len() - max_size;
        if over == 0 {
            return;
        }
        let mut keys: Vec<K> = storage.keys().cloned().collect();
        keys.sort_by_key(|k| storage[k].expire);
        for key in keys.into_iter().take(over) {
            storage.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A manually-advanced stand-in for the monotonic clock, so expiry tests
    /// don't depend on real sleeps or wall-clock timing.
    #[derive(Clone)]
    struct FakeClock(Arc<Mutex<Instant>>);

    impl FakeClock {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(Instant::now())))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock().expect("fake clock mutex poisoned") += by;
        }

        fn timer(&self) -> Timer {
            let inner = self.0.clone();
            Arc::new(move || *inner.lock().expect("fake clock mutex poisoned"))
        }
    }

    #[test]
    fn stores_and_fetches_fresh_entry() {
        let cache = TtlCache::new(10, Duration::from_secs(60));
        cache.store("a", "b", None);
        assert_eq!(cache.get(&"a"), Some("b"));
    }

    #[test]
    fn expired_entry_is_absent_and_reaped() {
        let clock = FakeClock::new();
        let cache = TtlCache::with_timer(10, Duration::from_secs(10), clock.timer());
        cache.store("a", "b", Some(Duration::from_secs(1)));
        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn ttl_is_capped_at_max_ttl() {
        let clock = FakeClock::new();
        let cache = TtlCache::with_timer(10, Duration::from_millis(5), clock.timer());
        cache.store("a", "b", Some(Duration::from_secs(60)));
        clock.advance(Duration::from_millis(20));
        assert_eq!(cache.get(&"a"), None);
    }

    #[test]
    fn eviction_keeps_exactly_max_size_entries() {
        let cache = TtlCache::new(3, Duration::from_secs(60));
        for i in 0..10 {
            cache.store(i.to_string(), i, None);
        }
        assert_eq!(cache.len(), 3);
        let present = (0..10).filter(|i| cache.get(&i.to_string()).is_some()).count();
        assert_eq!(present, 3);
    }

    #[test]
    fn eviction_prefers_soonest_to_expire() {
        let clock = FakeClock::new();
        let cache = TtlCache::with_timer(2, Duration::from_secs(60), clock.timer());
        cache.store("soon", 1, Some(Duration::from_millis(1)));
        cache.store("later", 2, Some(Duration::from_secs(30)));
        clock.advance(Duration::from_millis(10));
        cache.store("newest", 3, Some(Duration::from_secs(30)));
        // inserting "newest" pushes len to 3, over=1: "soon" is already
        // expired so it has the smallest expire and is evicted first.
        assert_eq!(cache.get(&"soon"), None);
        assert_eq!(cache.get(&"later"), Some(2));
        assert_eq!(cache.get(&"newest"), Some(3));
    }

    #[test]
    fn delete_is_idempotent() {
        let cache: TtlCache<&str, i32> = TtlCache::new(10, Duration::from_secs(60));
        cache.delete(&"missing");
        cache.store("present", 1, None);
        cache.delete(&"present");
        assert!(cache.is_empty());
    }
}
