//! TTL cache for backend results.
//!
//! [`TtlCache::get`] memoizes the result of an async fetcher per key. A valid
//! entry (younger than its TTL) is returned without calling the fetcher. When
//! a refresh fails and an older entry exists, that stale value is served
//! instead of the error.
//!
//! Concurrent `get` calls for the same missing key are not coalesced: each
//! caller runs its own fetcher and the last one to finish wins the slot.
//!
//! ```ignore
//! let cache: TtlCache = TtlCache::new(Duration::from_secs(30));
//! let containers = cache
//!     .get("containers", || backend.invoke("list_containers", json!({})), None)
//!     .await?;
//! ```

mod stats;

pub use stats::{CacheEntryStats, CacheStats};

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default TTL when neither the caller nor the config provides one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    fn is_valid(&self, now: Instant) -> bool {
        self.age(now) < self.ttl
    }
}

/// Key/value cache whose entries expire after a per-entry TTL.
///
/// Values are cloned out on every hit, so large payloads should be wrapped in
/// an `Arc`. The default value type is `serde_json::Value`, which is what the
/// backend bridge returns.
#[derive(Debug)]
pub struct TtlCache<V = serde_json::Value> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    default_ttl: Duration,
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Serialize,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Serialize,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the cached value for `key`, or fetch and store a fresh one.
    ///
    /// On fetch failure the previous entry for `key` is returned if one is
    /// still held, however old. Without one the fetcher's error propagates.
    pub async fn get<F, Fut, E>(&self, key: &str, fetcher: F, ttl: Option<Duration>) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::fmt::Display,
    {
        let stale = {
            let entries = self.entries.lock();
            match entries.get(key) {
                Some(entry) if entry.is_valid(Instant::now()) => {
                    tracing::debug!(
                        "Cache hit: {} (age: {}ms)",
                        key,
                        entry.age(Instant::now()).as_millis()
                    );
                    return Ok(entry.value.clone());
                }
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };

        tracing::debug!("Cache miss: {} - fetching", key);
        match fetcher().await {
            Ok(value) => {
                self.set(key, value.clone(), ttl);
                Ok(value)
            }
            Err(e) => match stale {
                Some(value) => {
                    tracing::warn!("Fetch failed for '{}', serving stale data: {}", key, e);
                    Ok(value)
                }
                None => Err(e),
            },
        }
    }

    /// Store `value` under `key` with a fresh timestamp.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries
            .lock()
            .insert(key.to_string(), CacheEntry::new(value, ttl));
        tracing::debug!("Cache set: {} (ttl: {}ms)", key, ttl.as_millis());
    }

    /// Whether `key` holds a valid entry. An expired entry is evicted.
    pub fn has(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get(key) else {
            return false;
        };
        if entry.is_valid(Instant::now()) {
            return true;
        }
        entries.remove(key);
        false
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.entries.lock().remove(key).is_some();
        if removed {
            tracing::debug!("Cache invalidate: {}", key);
        }
        removed
    }

    /// Remove every entry whose key matches the regular expression `pattern`.
    pub fn invalidate_pattern(&self, pattern: &str) -> crate::Result<usize> {
        let regex = Regex::new(pattern)?;
        Ok(self.invalidate_matching(&regex))
    }

    /// Remove every entry whose key matches `regex`. Returns the count removed.
    pub fn invalidate_matching(&self, regex: &Regex) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !regex.is_match(key));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("Cache invalidate pattern: {} ({} keys)", regex, removed);
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        let size = entries.len();
        entries.clear();
        tracing::debug!("Cache cleared ({} keys)", size);
    }

    /// Drop every expired entry. Returns the count removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid(now));
        let cleaned = before - entries.len();
        if cleaned > 0 {
            tracing::info!("Cache cleanup: {} expired entries removed", cleaned);
        }
        cleaned
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();

        let mut items: Vec<CacheEntryStats> = entries
            .iter()
            .map(|(key, entry)| CacheEntryStats {
                key: key.clone(),
                age_ms: entry.age(now).as_millis() as u64,
                ttl_ms: entry.ttl.as_millis() as u64,
                expired: !entry.is_valid(now),
                size: serde_json::to_string(&entry.value)
                    .map(|s| s.len())
                    .unwrap_or(0),
            })
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));

        CacheStats {
            size: items.len(),
            keys: items.iter().map(|e| e.key.clone()).collect(),
            entries: items,
        }
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Serialize + Send + 'static,
{
    /// Run [`cleanup`](Self::cleanup) every `period` until `cancel` fires.
    pub fn spawn_cleanup(self: &Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("Cache cleanup loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let Some(cache) = cache.upgrade() else {
                            break;
                        };
                        cache.cleanup();
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_has_evicts_expired_entry() {
        let cache: TtlCache = TtlCache::default();
        cache.set("images", json!([1, 2]), Some(Duration::from_millis(100)));
        assert!(cache.has("images"));

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(!cache.has("images"));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_only_removes_expired() {
        let cache: TtlCache = TtlCache::default();
        cache.set("short", json!(1), Some(Duration::from_secs(1)));
        cache.set("long", json!(2), Some(Duration::from_secs(60)));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.cleanup(), 1);
        assert!(cache.has("long"));
        assert!(!cache.has("short"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_report_age_and_size() {
        let cache: TtlCache = TtlCache::new(Duration::from_secs(10));
        cache.set("b", json!("xy"), None);
        cache.set("a", json!([1]), Some(Duration::from_secs(1)));
        tokio::time::advance(Duration::from_secs(2)).await;

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.keys, vec!["a".to_string(), "b".to_string()]);

        let a = &stats.entries[0];
        assert!(a.expired);
        assert_eq!(a.ttl_ms, 1000);
        assert_eq!(a.size, "[1]".len());

        let b = &stats.entries[1];
        assert!(!b.expired);
        assert_eq!(b.age_ms, 2000);
        assert_eq!(b.size, "\"xy\"".len());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let cache: TtlCache = TtlCache::default();
        assert!(cache.invalidate_pattern("(unclosed").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_loop_sweeps_periodically() {
        let cache: Arc<TtlCache> = Arc::new(TtlCache::default());
        cache.set("containers", json!([]), Some(Duration::from_secs(1)));

        let cancel = CancellationToken::new();
        let handle = cache.spawn_cleanup(Duration::from_secs(60), cancel.clone());

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(cache.is_empty());

        cancel.cancel();
        handle.await.unwrap();
    }
}
