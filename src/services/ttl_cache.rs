//! Expiring key/value cache
//!
//! Thin wrapper over `moka` where every entry carries its own TTL, so one
//! cache type serves both the short-lived read cache and the long-lived FX
//! rate cache. Expired entries are never returned; they are dropped lazily
//! or replaced on the next write.

use moka::Expiry;
use moka::future::Cache;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

struct PerEntryTtl;

impl<K, V> Expiry<K, Entry<V>> for PerEntryTtl {
    fn expire_after_create(&self, _key: &K, entry: &Entry<V>, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    // Overwrites restart the clock with the new entry's TTL
    fn expire_after_update(
        &self,
        _key: &K,
        entry: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Cloning shares the underlying storage.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, Entry<V>>,
    default_ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        let inner = Cache::builder().expire_after(PerEntryTtl).build();
        Self { inner, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key).await.map(|entry| entry.value)
    }

    /// A zero `ttl` stores nothing.
    pub async fn set(&self, key: K, value: V, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }
        self.inner.insert(key, Entry { value, ttl }).await;
    }

    /// Return the live value for `key`, or run `compute` and store its
    /// result for `ttl`. Errors from `compute` are returned and nothing is
    /// cached.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, value.clone(), ttl).await;
        Ok(value)
    }
}
