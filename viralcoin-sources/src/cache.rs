//! Source result caching
//!
//! [`CachedSource`] serves a wrapped adapter's records from a [`TrendCache`]
//! until they expire. Concurrent refreshes of the same key are collapsed:
//! callers queue on the cache's per-key lock and only the first one reaches
//! upstream, whichever wrapper it came through.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use viralcoin_core::{SourceId, TrendRecord};

use crate::{SourceAdapter, SourceError};

/// Identifies one cached fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: SourceId,
    /// Owner of the entry, the adapter name unless the wrapper sets one
    pub scope: String,
    pub limit: usize,
}

/// Storage for fetched record batches
pub trait TrendCache: Send + Sync {
    /// Records for `key`, `None` when absent or expired
    fn get(&self, key: &CacheKey) -> Option<Vec<TrendRecord>>;

    /// Store records for `ttl`
    fn put(&self, key: CacheKey, records: Vec<TrendRecord>, ttl: Duration);

    /// Drop any entry for `key`
    fn invalidate(&self, key: &CacheKey);

    /// Locks serializing refreshes of each entry
    fn refresh_locks(&self) -> &RefreshLocks;
}

/// One refresh lock per cache key, removed once no caller holds or awaits it
#[derive(Default)]
pub struct RefreshLocks {
    locks: DashMap<CacheKey, Arc<Mutex<()>>>,
}

impl RefreshLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive refresh rights on `key`
    pub async fn acquire(&self, key: &CacheKey) -> RefreshGuard<'_> {
        let lock = self.locks.entry(key.clone()).or_default().value().clone();
        let guard = lock.lock_owned().await;

        RefreshGuard {
            locks: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Keys with a refresh in flight or queued
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while refreshing one key
pub struct RefreshGuard<'a> {
    locks: &'a RefreshLocks,
    key: CacheKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone of the lock, so it stays while any remain
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

struct CacheEntry {
    records: Vec<TrendRecord>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.expires_at.map_or(true, |at| Instant::now() < at)
    }
}

/// In-process cache with per-entry expiry
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, CacheEntry>,
    refresh: RefreshLocks,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TrendCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<TrendRecord>> {
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_fresh() => return Some(entry.records.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_fresh());
        }
        None
    }

    fn put(&self, key: CacheKey, records: Vec<TrendRecord>, ttl: Duration) {
        // A TTL past the clock's range never expires
        let expires_at = Instant::now().checked_add(ttl);
        self.entries.insert(key, CacheEntry { records, expires_at });
    }

    fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
    }

    fn refresh_locks(&self) -> &RefreshLocks {
        &self.refresh
    }
}

/// Adapter wrapper that serves fresh cached records instead of refetching
pub struct CachedSource<A> {
    inner: A,
    cache: Arc<dyn TrendCache>,
    ttl: Duration,
    scope: String,
}

impl<A: SourceAdapter> CachedSource<A> {
    pub fn new(inner: A, cache: Arc<dyn TrendCache>, ttl: Duration) -> Self {
        let scope = inner.name().to_string();
        Self {
            inner,
            cache,
            ttl,
            scope,
        }
    }

    /// Wrap with a private in-memory cache
    pub fn in_memory(inner: A, ttl: Duration) -> Self {
        Self::new(inner, Arc::new(MemoryCache::new()), ttl)
    }

    /// Key entries by `scope` instead of the adapter name
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    fn key(&self, limit: usize) -> CacheKey {
        CacheKey {
            source: self.inner.source(),
            scope: self.scope.clone(),
            limit,
        }
    }
}

#[async_trait]
impl<A: SourceAdapter> SourceAdapter for CachedSource<A> {
    fn source(&self) -> SourceId {
        self.inner.source()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<TrendRecord>, SourceError> {
        let key = self.key(limit);

        if let Some(records) = self.cache.get(&key) {
            debug!("{}: cache hit", self.inner.name());
            return Ok(records);
        }

        let _guard = self.cache.refresh_locks().acquire(&key).await;

        // Another caller may have refreshed while we waited
        if let Some(records) = self.cache.get(&key) {
            debug!("{}: refreshed by a concurrent caller", self.inner.name());
            return Ok(records);
        }

        debug!("{}: cache miss, fetching", self.inner.name());
        let records = self.inner.fetch(limit).await?;
        self.cache.put(key, records.clone(), self.ttl);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockSource;

    fn key(limit: usize) -> CacheKey {
        CacheKey {
            source: SourceId::Search,
            scope: "mock-search".to_string(),
            limit,
        }
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        let records = vec![TrendRecord::new(SourceId::Search, "tokenomics", 35.0)];

        assert!(cache.get(&key(10)).is_none());
        cache.put(key(10), records.clone(), Duration::from_secs(60));
        assert_eq!(cache.get(&key(10)), Some(records));
        assert!(cache.get(&key(5)).is_none());

        cache.invalidate(&key(10));
        assert!(cache.get(&key(10)).is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = MemoryCache::new();
        cache.put(key(10), Vec::new(), Duration::ZERO);
        assert!(cache.get(&key(10)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let cache = MemoryCache::new();
        let records = vec![TrendRecord::new(SourceId::Search, "tokenomics", 35.0)];
        cache.put(key(10), records.clone(), Duration::from_secs(u64::MAX));
        assert_eq!(cache.get(&key(10)), Some(records));
    }

    #[tokio::test]
    async fn test_cached_source_serves_from_cache() {
        let source = CachedSource::in_memory(MockSource::new(SourceId::Search), Duration::from_secs(60));

        let first = source.fetch(5).await.unwrap();
        let second = source.fetch(5).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.inner().fetch_count(), 1);

        // A different limit is a different key
        source.fetch(3).await.unwrap();
        assert_eq!(source.inner().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let source = CachedSource::in_memory(MockSource::new(SourceId::Social), Duration::ZERO);
        source.fetch(10).await.unwrap();
        source.fetch(10).await.unwrap();
        assert_eq!(source.inner().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_fetches_once() {
        let mock = MockSource::new(SourceId::Forum).with_delay(Duration::from_millis(50));
        let source = Arc::new(CachedSource::in_memory(mock, Duration::from_secs(60)));

        let calls = (0..8).map(|_| {
            let source = Arc::clone(&source);
            async move { source.fetch(10).await }
        });
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert_eq!(result.unwrap().len(), 10);
        }
        assert_eq!(source.inner().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_across_wrappers_fetches_once() {
        let memory = Arc::new(MemoryCache::new());
        let cache: Arc<dyn TrendCache> = memory.clone();
        let ttl = Duration::from_secs(60);
        let delay = Duration::from_millis(50);

        let a = CachedSource::new(MockSource::new(SourceId::Forum).with_delay(delay), Arc::clone(&cache), ttl);
        let b = CachedSource::new(MockSource::new(SourceId::Forum).with_delay(delay), Arc::clone(&cache), ttl);

        let (first, second) = tokio::join!(a.fetch(10), b.fetch(10));
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(a.inner().fetch_count() + b.inner().fetch_count(), 1);

        // Locks are released once the refresh completes
        assert!(memory.refresh_locks().is_empty());
    }

    #[tokio::test]
    async fn test_scoped_wrappers_do_not_share_entries() {
        let cache: Arc<dyn TrendCache> = Arc::new(MemoryCache::new());
        let ttl = Duration::from_secs(60);
        let alpha = vec![TrendRecord::new(SourceId::Social, "#Alpha", 1.0)];
        let bravo = vec![TrendRecord::new(SourceId::Social, "#Bravo", 1.0)];

        let a = CachedSource::new(
            MockSource::with_records(SourceId::Social, alpha.clone()).with_name("social-feed"),
            Arc::clone(&cache),
            ttl,
        )
        .with_scope("social-feed#0");
        let b = CachedSource::new(
            MockSource::with_records(SourceId::Social, bravo.clone()).with_name("social-feed"),
            Arc::clone(&cache),
            ttl,
        )
        .with_scope("social-feed#1");

        assert_eq!(a.fetch(10).await.unwrap(), alpha);
        assert_eq!(b.fetch(10).await.unwrap(), bravo);
        assert_eq!(b.fetch(10).await.unwrap(), bravo);
        assert_eq!(b.inner().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mock = MockSource::new(SourceId::News).failing("upstream down");
        let source = CachedSource::in_memory(mock, Duration::from_secs(60));

        assert!(source.fetch(10).await.is_err());
        assert!(source.fetch(10).await.is_err());
        assert_eq!(source.inner().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_shared_cache_between_wrappers() {
        let cache: Arc<dyn TrendCache> = Arc::new(MemoryCache::new());
        let a = CachedSource::new(MockSource::new(SourceId::Search), Arc::clone(&cache), Duration::from_secs(60));
        let b = CachedSource::new(MockSource::new(SourceId::Search), Arc::clone(&cache), Duration::from_secs(60));

        a.fetch(10).await.unwrap();
        b.fetch(10).await.unwrap();
        assert_eq!(a.inner().fetch_count() + b.inner().fetch_count(), 1);
    }
}
