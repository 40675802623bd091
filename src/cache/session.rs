//! Cache stored inside a caller-owned session.
//!
//! Web hosts usually keep per-user state in a session object whose
//! lifetime they control. [`SessionCache`] stores its entries there, as a
//! single JSON object under one session field, so the cache lives and dies
//! with the session rather than with the client.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use super::{Cache, CacheEntry, CacheMode};
use crate::types::Params;
use crate::{LecternError, Result};

/// Session field the cache is stored under unless overridden.
pub const DEFAULT_SESSION_FIELD: &str = "lecternCache";

/// Access to an external per-session context.
///
/// Implement this over whatever session mechanism the host uses. Reads
/// and writes may suspend (e.g. a redis-backed session store).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a field, `None` if it was never written.
    async fn get_field(&self, field: &str) -> Result<Option<Value>>;

    /// Write a field, replacing any previous value.
    async fn set_field(&self, field: &str, value: Value) -> Result<()>;
}

/// A session held in process memory.
///
/// Useful for tests and for single-process hosts that keep one session per
/// user in their own maps.
#[derive(Debug, Default)]
pub struct InMemorySession {
    fields: RwLock<Params>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySession {
    async fn get_field(&self, field: &str) -> Result<Option<Value>> {
        Ok(self.fields.read().await.get(field).cloned())
    }

    async fn set_field(&self, field: &str, value: Value) -> Result<()> {
        self.fields.write().await.insert(field.to_owned(), value);
        Ok(())
    }
}

/// Value-only cache persisted in a [`SessionStore`].
pub struct SessionCache {
    session: Arc<dyn SessionStore>,
    field: String,
    // serialises read-modify-write cycles issued through this handle
    write_lock: Mutex<()>,
}

impl SessionCache {
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self::with_field(session, DEFAULT_SESSION_FIELD)
    }

    /// Store entries under a custom session field.
    pub fn with_field(session: Arc<dyn SessionStore>, field: impl Into<String>) -> Self {
        Self {
            session,
            field: field.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Params> {
        match self.session.get_field(&self.field).await? {
            None | Some(Value::Null) => Ok(Params::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(LecternError::Cache(format!(
                "session field '{}' holds {} instead of an object",
                self.field,
                kind_of(&other)
            ))),
        }
    }

    async fn store(&self, entries: Params) -> Result<()> {
        self.session
            .set_field(&self.field, Value::Object(entries))
            .await
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl Cache for SessionCache {
    fn mode(&self) -> CacheMode {
        CacheMode::ValueCache
    }

    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.load().await?.remove(key).map(CacheEntry::Ready))
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<()> {
        let CacheEntry::Ready(value) = entry else {
            return Err(LecternError::Cache(
                "session cache can only store finished values".into(),
            ));
        };
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_owned(), value);
        self.store(entries).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.store(entries).await?;
        }
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(key);
        }
        if entries.len() != before {
            self.store(entries).await?;
        }
        Ok(())
    }

    async fn list_all_keys(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.keys().cloned().collect())
    }
}
