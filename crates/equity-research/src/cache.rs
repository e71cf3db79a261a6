//! Time-bounded response cache for provider calls

use cached::{Cached, TimedCache};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Thread-safe cache keyed by request string, e.g. `quote:AAPL`
///
/// Concurrent misses on the same key are coalesced: one caller fetches while
/// the others wait for its result.
pub struct ResponseCache<V> {
    cache: Arc<RwLock<TimedCache<String, V>>>,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key.into(), value);
    }

    /// Return the cached value or run `fetcher` and cache its success.
    ///
    /// Errors are never cached; a caller that waited on a failed fetch runs
    /// its own `fetcher`.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key).await {
            tracing::debug!(key, "Cache hit");
            return Ok(value);
        }

        let gate = self.gate(key).await;
        let guard = gate.lock().await;
        if let Some(value) = self.get(key).await {
            tracing::debug!(key, "Cache filled by concurrent fetch");
            drop(guard);
            self.release(key, gate).await;
            return Ok(value);
        }

        tracing::debug!(key, "Cache miss");
        let result = fetcher().await;
        if let Ok(value) = &result {
            self.insert(key, value.clone()).await;
        }
        drop(guard);
        self.release(key, gate).await;
        result
    }

    async fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    /// Drop the key's gate once no other caller holds it
    async fn release(&self, key: &str, gate: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        // the map and `gate` are the last two owners
        if Arc::strong_count(&gate) == 2 {
            in_flight.remove(key);
        }
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }
}

impl<V> Clone for ResponseCache<V> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_get_or_fetch_caches_success() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let mut calls = 0;

        let value = cache
            .get_or_fetch("quote:AAPL", || {
                calls += 1;
                async { Ok::<_, String>(150.0) }
            })
            .await
            .unwrap();
        assert_eq!(value, 150.0);

        let value = cache
            .get_or_fetch("quote:AAPL", || {
                calls += 1;
                async { Ok::<_, String>(999.0) }
            })
            .await
            .unwrap();
        assert_eq!(value, 150.0);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let calls = &AtomicUsize::new(0);
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, String>(190.0)
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_fetch("info:AAPL", fetch),
            cache.get_or_fetch("info:AAPL", fetch),
            cache.get_or_fetch("info:AAPL", fetch),
        );
        assert_eq!((a, b, c), (Ok(190.0), Ok(190.0), Ok(190.0)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_refetches_after_failed_fetch() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let calls = &AtomicUsize::new(0);
        let fetch = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n == 0 { Err("HTTP 503".to_string()) } else { Ok(42.0) }
        };

        let (first, second) = tokio::join!(
            cache.get_or_fetch("info:MSFT", fetch),
            cache.get_or_fetch("info:MSFT", fetch),
        );
        assert_eq!(first, Err("HTTP 503".to_string()));
        assert_eq!(second, Ok(42.0));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: ResponseCache<f64> = ResponseCache::new(Duration::from_secs(60));

        let result = cache
            .get_or_fetch("quote:ZZZZ", || async { Err::<f64, _>("boom") })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let other = cache.clone();

        cache.insert("history:MSFT", vec![1.0, 2.0]).await;
        assert_eq!(other.get("history:MSFT").await, Some(vec![1.0, 2.0]));

        other.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
