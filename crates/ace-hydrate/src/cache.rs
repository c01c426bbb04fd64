//! Endpoint-keyed hydration cache
//!
//! Built on moka: TTL validity is checked at read time, not by an
//! eviction timer, and concurrent loads of the same endpoint are
//! coalesced: two leaves requesting one endpoint share one fetch.

use crate::error::HydrationError;
use moka::future::Cache;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Shared endpoint→response cache
#[derive(Debug, Clone)]
pub struct HydrationCache {
    inner: Cache<String, Value>,
}

impl HydrationCache {
    /// Create a cache with the given entry TTL and capacity
    #[must_use]
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Return the cached response, or run `load` exactly once and cache it.
    ///
    /// Concurrent callers for the same endpoint wait on the same load;
    /// a failed load is handed to every waiter and caches nothing.
    ///
    /// # Errors
    /// The load's [`HydrationError`], cloned per waiter.
    pub async fn get_or_fetch<F>(&self, endpoint: &str, load: F) -> Result<Value, HydrationError>
    where
        F: Future<Output = Result<Value, HydrationError>>,
    {
        self.inner
            .try_get_with(endpoint.to_string(), load)
            .await
            .map_err(|shared| (*shared).clone())
    }

    /// Whether an endpoint currently has a live entry
    #[inline]
    #[must_use]
    pub async fn contains(&self, endpoint: &str) -> bool {
        self.inner.get(endpoint).await.is_some()
    }

    /// Drop one endpoint's entry
    #[inline]
    pub async fn invalidate(&self, endpoint: &str) {
        self.inner.invalidate(endpoint).await;
    }

    /// Drop everything
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Approximate live entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn caches_loaded_value() {
        let cache = HydrationCache::new(Duration::from_secs(60), 16);
        let loads = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let loads = loads.clone();
            let value = cache
                .get_or_fetch("/api/kpi", async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "v": 1 }))
                })
                .await
                .unwrap();
            assert_eq!(value["v"], 1);
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_load_caches_nothing() {
        let cache = HydrationCache::new(Duration::from_secs(60), 16);

        let err = cache
            .get_or_fetch("/api/kpi", async {
                Err(HydrationError::Timeout {
                    endpoint: "/api/kpi".into(),
                    timeout_ms: 5,
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, HydrationError::Timeout { .. }));
        assert!(!cache.contains("/api/kpi").await);

        // A later load can still succeed
        let value = cache
            .get_or_fetch("/api/kpi", async { Ok(json!(2)) })
            .await
            .unwrap();
        assert_eq!(value, json!(2));
    }

    #[tokio::test]
    async fn ttl_expires_at_read_time() {
        let cache = HydrationCache::new(Duration::from_millis(20), 16);

        cache
            .get_or_fetch("/api/kpi", async { Ok(json!(1)) })
            .await
            .unwrap();
        assert!(cache.contains("/api/kpi").await);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!cache.contains("/api/kpi").await);
    }

    #[tokio::test]
    async fn invalidation() {
        let cache = HydrationCache::new(Duration::from_secs(60), 16);
        cache
            .get_or_fetch("/api/kpi", async { Ok(json!(1)) })
            .await
            .unwrap();

        cache.invalidate("/api/kpi").await;
        assert!(!cache.contains("/api/kpi").await);
    }
}
