//! The cache contract and its in-memory backend.
//!
//! TTL eviction is read-time lazy: an expired entry is deleted by the read
//! that observed the expiry, not by a background reaper. `resolve` is a
//! read-through single-flight operation: concurrent callers may each invoke
//! the resolver once, but only the `updated_at` of the last successful
//! write wins.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forex_core::error::ForexError;
use forex_core::types::{CacheEntry, CacheKey, FeedPayload};

use crate::feed::{FeedKind, FeedOrchestrator};

/// A boxed, `Send` future yielding a feed payload.
pub type BoxedResolverFuture = Pin<Box<dyn Future<Output = Result<FeedPayload, ForexError>> + Send>>;

/// The resolver a `resolve` call invokes on a cache miss: either a plain
/// closure (used by tests to inject fixtures or errors) or a reified
/// `{orchestrator, feed kind}` descriptor (the production dispatch path).
/// Representing both as one sum type keeps `Cache::resolve` agnostic to
/// which one it was handed.
#[derive(Clone)]
pub enum ResolverSpec {
    Closure(Arc<dyn Fn() -> BoxedResolverFuture + Send + Sync>),
    Feed { orchestrator: Arc<FeedOrchestrator>, kind: FeedKind },
}

impl ResolverSpec {
    pub fn closure<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<FeedPayload, ForexError>> + Send + 'static,
    {
        Self::Closure(Arc::new(move || Box::pin(f())))
    }

    pub fn feed(orchestrator: Arc<FeedOrchestrator>, kind: FeedKind) -> Self {
        Self::Feed { orchestrator, kind }
    }

    pub async fn call(&self) -> Result<FeedPayload, ForexError> {
        match self {
            Self::Closure(f) => f().await,
            Self::Feed { orchestrator, kind } => {
                orchestrator.fetch(*kind).await.map_err(ForexError::from)
            }
        }
    }
}

/// Shared behavioral contract implemented by every cache backend.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Idempotent: ensures the backing store exists.
    async fn init(&self) -> Result<(), ForexError>;

    /// Returns the stored value, evicting it first if `ttl` has elapsed.
    async fn get(&self, key: CacheKey, ttl: Option<Duration>) -> Option<CacheEntry>;

    /// Upserts and returns the stored entry. Fails with
    /// `ForexError::ResolverFailed` if the backing store could not be
    /// written (e.g. a disk-full or read-only on-disk backend) — the
    /// in-memory backend never fails.
    async fn put(&self, key: CacheKey, value: FeedPayload, updated_at: DateTime<Utc>) -> Result<CacheEntry, ForexError>;

    /// Removes one key; succeeds whether or not it existed.
    async fn delete(&self, key: CacheKey);

    /// Timestamps of every stored key.
    async fn last_updated(&self) -> Vec<(CacheKey, DateTime<Utc>)>;

    /// Timestamp of one key, if stored.
    async fn last_updated_key(&self, key: CacheKey) -> Option<DateTime<Utc>>;

    /// Clears all entries and reinitializes an empty store.
    async fn reset(&self) -> Result<(), ForexError>;

    /// Releases backing resources.
    async fn terminate(&self) -> Result<(), ForexError>;

    /// True iff the backing store exists.
    async fn initialized(&self) -> bool;

    /// Single-flight read-through: return the cached value if present
    /// (subject to `ttl`), else invoke `resolver`. On success the entry is
    /// written with `updated_at = now()` and that write's own failure (not
    /// just the resolver's) surfaces as `ForexError::ResolverFailed`; on a
    /// failed resolver call the cache is left untouched and the same error
    /// is returned.
    async fn resolve(
        &self,
        key: CacheKey,
        resolver: &ResolverSpec,
        ttl: Option<Duration>,
    ) -> Result<FeedPayload, ForexError> {
        if let Some(entry) = self.get(key, ttl).await {
            return Ok(entry.value);
        }

        match resolver.call().await {
            Ok(value) => {
                let entry = self.put(key, value, Utc::now()).await?;
                Ok(entry.value)
            }
            Err(_) => Err(ForexError::ResolverFailed),
        }
    }
}

/// Many-reader/few-writer in-memory backend: a shared map guarded by a
/// `RwLock`, with no background reaper (eviction happens lazily on read).
pub struct InMemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    initialized: RwLock<bool>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self { entries: RwLock::new(HashMap::new()), initialized: RwLock::new(false) }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn init(&self) -> Result<(), ForexError> {
        *self.initialized.write().unwrap() = true;
        Ok(())
    }

    async fn get(&self, key: CacheKey, ttl: Option<Duration>) -> Option<CacheEntry> {
        let expired = {
            let entries = self.entries.read().unwrap();
            match entries.get(&key) {
                None => return None,
                Some(entry) => match ttl {
                    Some(ttl) => {
                        let age = Utc::now().signed_duration_since(entry.updated_at);
                        age.to_std().map(|age| age > ttl).unwrap_or(false)
                    }
                    None => false,
                },
            }
        };

        if expired {
            self.entries.write().unwrap().remove(&key);
            return None;
        }

        self.entries.read().unwrap().get(&key).cloned()
    }

    async fn put(&self, key: CacheKey, value: FeedPayload, updated_at: DateTime<Utc>) -> Result<CacheEntry, ForexError> {
        let entry = CacheEntry { value, updated_at };
        self.entries.write().unwrap().insert(key, entry.clone());
        Ok(entry)
    }

    async fn delete(&self, key: CacheKey) {
        self.entries.write().unwrap().remove(&key);
    }

    async fn last_updated(&self) -> Vec<(CacheKey, DateTime<Utc>)> {
        self.entries.read().unwrap().iter().map(|(k, v)| (*k, v.updated_at)).collect()
    }

    async fn last_updated_key(&self, key: CacheKey) -> Option<DateTime<Utc>> {
        self.entries.read().unwrap().get(&key).map(|e| e.updated_at)
    }

    async fn reset(&self) -> Result<(), ForexError> {
        self.entries.write().unwrap().clear();
        *self.initialized.write().unwrap() = true;
        Ok(())
    }

    async fn terminate(&self) -> Result<(), ForexError> {
        *self.initialized.write().unwrap() = false;
        Ok(())
    }

    async fn initialized(&self) -> bool {
        *self.initialized.read().unwrap()
    }
}
