//! In-process cache backed by moka.

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use moka::ops::compute::{CompResult, Op};

use super::{Cache, CacheEntry, CacheMode, SharedResponse};
use crate::Result;

/// Unbounded in-memory cache.
///
/// Entries live until they are invalidated or the cache is dropped; there
/// is no capacity limit and no TTL. Cloning a `MemoryCache` is cheap and
/// the clones share storage.
///
/// ```rust
/// # use lectern::cache::{CacheMode, MemoryCache};
/// let cache = MemoryCache::new(CacheMode::FutureCache);
/// assert_eq!(cache.len(), 0);
/// ```
#[derive(Clone)]
pub struct MemoryCache {
    entries: MokaCache<String, CacheEntry>,
    mode: CacheMode,
}

impl MemoryCache {
    pub fn new(mode: CacheMode) -> Self {
        Self {
            entries: MokaCache::builder().build(),
            mode,
        }
    }

    /// Approximate number of stored entries.
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().next().is_none()
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(CacheMode::default())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    fn mode(&self) -> CacheMode {
        self.mode
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<()> {
        self.entries.insert(key.to_owned(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn list_all_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .entries
            .iter()
            .map(|(key, _)| key.as_ref().clone())
            .collect())
    }

    async fn get_or_insert(&self, key: &str, entry: CacheEntry) -> Result<(CacheEntry, bool)> {
        let stored = self.entries.entry_by_ref(key).or_insert(entry).await;
        let fresh = stored.is_fresh();
        Ok((stored.into_value(), fresh))
    }

    async fn evict_failed(&self, key: &str, failed: &SharedResponse) -> Result<bool> {
        let outcome = self
            .entries
            .entry_by_ref(key)
            .and_compute_with(|current| {
                let same = current.is_some_and(|e| e.value().is_flight(failed));
                std::future::ready(if same { Op::Remove } else { Op::Nop })
            })
            .await;
        Ok(matches!(outcome, CompResult::Removed(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_or_insert_keeps_first_entry() {
        let cache = MemoryCache::new(CacheMode::ValueCache);
        let (first, fresh) = cache
            .get_or_insert("/a", CacheEntry::Ready(json!(1)))
            .await
            .unwrap();
        assert!(fresh);
        assert_eq!(first.resolve().await.unwrap(), json!(1));

        let (second, fresh) = cache
            .get_or_insert("/a", CacheEntry::Ready(json!(2)))
            .await
            .unwrap();
        assert!(!fresh);
        assert_eq!(second.resolve().await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn evict_failed_leaves_newer_flights_alone() {
        use futures_util::FutureExt;

        let cache = MemoryCache::new(CacheMode::FutureCache);
        let old: SharedResponse = async { Ok(json!("old")) }.boxed().shared();
        let new: SharedResponse = async { Ok(json!("new")) }.boxed().shared();
        cache.set("/a", CacheEntry::InFlight(new.clone())).await.unwrap();

        assert!(!cache.evict_failed("/a", &old).await.unwrap());
        assert!(cache.get("/a").await.unwrap().is_some());

        assert!(cache.evict_failed("/a", &new).await.unwrap());
        assert!(cache.get("/a").await.unwrap().is_none());
        assert!(!cache.evict_failed("/missing", &new).await.unwrap());
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let cache = MemoryCache::default();
        let other = cache.clone();
        cache.set("/a", CacheEntry::Ready(json!("x"))).await.unwrap();
        assert!(other.get("/a").await.unwrap().is_some());
        assert!(!other.is_empty());
        other.clear();
        assert!(cache.get("/a").await.unwrap().is_none());
    }
}
