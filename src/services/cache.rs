//! Thread-safe TTL cache used by the quote providers.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// A cache whose entries expire after a fixed TTL.
pub struct Cache<V> {
    data: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V: Clone> Cache<V> {
    /// Create a new cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            data: DashMap::new(),
            default_ttl,
        }
    }

    /// Get a value, dropping it if expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Set a value with the default TTL.
    pub fn set(&self, key: String, value: V) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.default_ttl,
            },
        );
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_set_and_get() {
        let cache = Cache::new(Duration::from_secs(30));
        cache.set("BTCUSDT".to_string(), 60_000.0);
        assert_eq!(cache.get("BTCUSDT"), Some(60_000.0));
    }

    #[test]
    fn test_cache_miss() {
        let cache: Cache<f64> = Cache::new(Duration::from_secs(30));
        assert_eq!(cache.get("ETHUSDT"), None);
    }

    #[test]
    fn test_cache_expiry() {
        let cache = Cache::new(Duration::from_millis(0));
        cache.set("BTCUSDT".to_string(), 60_000.0);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("BTCUSDT"), None);
    }

    #[test]
    fn test_cache_clear() {
        let cache = Cache::new(Duration::from_secs(30));
        cache.set("AAPL".to_string(), 150.0);
        cache.clear();
        assert_eq!(cache.get("AAPL"), None);
    }
}
