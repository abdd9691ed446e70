//! Cache layer
//!
//! In-process caching for hot read paths (published post/voice lists,
//! WordPress news). Values are stored as JSON so any serializable type can
//! be cached; invalidation is prefix-based.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait.
///
/// The generic methods make this trait non-object-safe; services hold a
/// concrete `Arc<MemoryCache>`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values whose key starts with the prefix
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Well-known cache key prefixes
pub mod keys {
    /// Published blog post lists and single posts
    pub const POSTS: &str = "posts:";
    /// Published voice lists and single voices
    pub const VOICES: &str = "voices:";
    /// WordPress news responses
    pub const NEWS: &str = "news:";
}

/// Create a cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);
        cache.set("k", &42u32, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get::<u32>("k").await.unwrap(), Some(42));
    }
}
