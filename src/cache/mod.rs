//! Caching subsystem.
//!
//! The [`Cache`] trait is the boundary the executor talks to. Any store
//! that provides atomic per-key `get`/`set`/`delete` plus a key listing can
//! back a client:
//!
//! - [`MemoryCache`]: in-process moka map, unbounded, lives as long as the
//!   client. Stores either values or in-flight futures ([`CacheMode`]).
//! - [`SessionCache`]: keeps entries inside a caller-owned session object
//!   reached through [`SessionStore`]. Values only.
//!
//! Invalidation is prefix-aware: see [`key`] for the key layout and the
//! wildcard rules.

pub mod key;
mod memory;
mod session;

pub use key::{cache_key, key_path, pattern_matches, resolve_invalidation};
pub use memory::MemoryCache;
pub use session::{InMemorySession, SessionCache, SessionStore};

use std::str::FromStr;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{LecternError, Result};

/// An in-flight request whose result every waiter shares.
pub type SharedResponse = Shared<BoxFuture<'static, Result<Value>>>;

/// How a cache stores what it is given, fixed at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// Store finished payloads.
    #[default]
    ValueCache,
    /// Store the in-flight future so concurrent callers for one key share a
    /// single request.
    FutureCache,
}

impl CacheMode {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ValueCache => "value",
            Self::FutureCache => "future",
        }
    }
}

/// One stored entry.
#[derive(Clone)]
pub enum CacheEntry {
    Ready(Value),
    InFlight(SharedResponse),
}

impl CacheEntry {
    /// Resolve the entry to its payload, awaiting an in-flight request.
    pub async fn resolve(self) -> Result<Value> {
        match self {
            Self::Ready(v) => Ok(v),
            Self::InFlight(fut) => fut.await,
        }
    }

    /// Whether this entry is the very in-flight request `flight`.
    pub fn is_flight(&self, flight: &SharedResponse) -> bool {
        match self {
            Self::InFlight(fut) => fut.ptr_eq(flight),
            Self::Ready(_) => false,
        }
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Self::InFlight(_) => f.write_str("InFlight(..)"),
        }
    }
}

/// Key/value store with prefix-aware deletion.
///
/// Every method is expected to be atomic for its key. Nothing here is
/// transactional across keys: `delete_many` is a sequence of deletes.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Storage mode chosen when the cache was built.
    fn mode(&self) -> CacheMode;

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete several keys. Keeps going past failures and reports the
    /// first one after every key has been attempted.
    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let mut first_err = None;
        for key in keys {
            if let Err(e) = self.delete(key).await {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Snapshot of every key currently stored.
    async fn list_all_keys(&self) -> Result<Vec<String>>;

    /// Return the existing entry for `key`, or store `entry` and return it.
    ///
    /// The boolean is `true` when `entry` was stored. Backends that can do
    /// this atomically should override the default get-then-set.
    async fn get_or_insert(&self, key: &str, entry: CacheEntry) -> Result<(CacheEntry, bool)> {
        if let Some(existing) = self.get(key).await? {
            return Ok((existing, false));
        }
        self.set(key, entry.clone()).await?;
        Ok((entry, true))
    }

    /// Remove `key` only while it still holds the in-flight request
    /// `failed`. Returns whether anything was removed.
    ///
    /// An entry stored under the key after `failed` (e.g. by a call that
    /// followed an invalidation) is left alone. Backends that can compare
    /// and remove atomically should override the default get-then-delete.
    async fn evict_failed(&self, key: &str, failed: &SharedResponse) -> Result<bool> {
        match self.get(key).await? {
            Some(current) if current.is_flight(failed) => {
                self.delete(key).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Which cache backend a client should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSelector {
    /// No caching.
    #[default]
    None,
    /// [`MemoryCache`].
    Memory,
    /// [`SessionCache`]; requires a [`SessionStore`].
    Session,
}

impl FromStr for CacheSelector {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "memory" => Ok(Self::Memory),
            "session" => Ok(Self::Session),
            other => Err(LecternError::InvalidCacheConfiguration(format!(
                "unsupported cache type '{other}' (expected none, memory or session)"
            ))),
        }
    }
}
