//! Expiring in-memory map.
//!
//! One mutex guards the backing map; every public operation holds it for the
//! duration of the call. A background sweep task evicts expired entries so
//! keys that are never read again still get dropped. At this scale nothing
//! finer-grained is needed.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    inner: Arc<Mutex<HashMap<K, Entry<V>>>>,
    ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), ttl: self.ttl }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())), ttl }
    }

    /// Returns the live value for `key`. An expired entry is removed and
    /// reported as absent even if the sweeper has not reached it yet.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut map = self.inner.lock().expect("ttl cache mutex poisoned");
        match map.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert or replace, restarting the entry's TTL window.
    pub fn set(&self, key: K, value: V) {
        let mut map = self.inner.lock().expect("ttl cache mutex poisoned");
        map.insert(key, Entry { value, expires_at: Instant::now() + self.ttl });
    }

    pub fn delete(&self, key: &K) {
        let mut map = self.inner.lock().expect("ttl cache mutex poisoned");
        map.remove(key);
    }

    pub fn clear(&self) {
        let mut map = self.inner.lock().expect("ttl cache mutex poisoned");
        map.clear();
    }

    /// Spawn the periodic eviction task. The task holds a weak handle so the
    /// cache is freed (and the task ends) once the last real user drops it.
    pub fn spawn_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let now = Instant::now();
                let mut map = inner.lock().expect("ttl cache mutex poisoned");
                map.retain(|_, entry| entry.expires_at > now);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete_clear() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("a".into(), 1);
        cache.set("b".into(), 2);
        assert_eq!(cache.get(&"a".into()), Some(1));

        cache.delete(&"a".into());
        assert_eq!(cache.get(&"a".into()), None);
        assert_eq!(cache.get(&"b".into()), Some(2));

        cache.clear();
        assert_eq!(cache.get(&"b".into()), None);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_millis(0));
        cache.set("k", 7);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&"k"), None);
    }

    #[tokio::test]
    async fn sweeper_evicts_in_background() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_millis(10));
        cache.set("k", 7);
        let handle = cache.spawn_sweeper(Duration::from_millis(5));

        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let map = cache.inner.lock().unwrap();
            assert!(map.is_empty(), "sweeper should have removed the expired entry");
        }
        handle.abort();
    }
}
