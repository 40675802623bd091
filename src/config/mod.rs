//! Configuration layers and the resolver.
//!
//! Three layers feed every call, highest precedence first:
//!
//! 1. per-call overrides ([`CallOptions::overrides`](crate::CallOptions))
//! 2. the [`ClientConfig`] the tree was built with
//! 3. global [`Defaults`]
//!
//! Each field resolves independently. Resolution is pure; the shared
//! handles (transport, cache) are fixed when the tree is built and carried
//! unchanged by every [`EffectiveConfig`].

mod file;

pub use file::{CONFIG_ENV_VAR, ENV_ACCESS_TOKEN, ENV_HOST};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::cache::{Cache, CacheMode, CacheSelector, MemoryCache, SessionCache, SessionStore};
use crate::transport::Transport;

/// Default Canvas host.
pub const DEFAULT_HOST: &str = "canvas.instructure.com";
/// Default API path prefix.
pub const DEFAULT_PATH_PREFIX: &str = "/api/v1";
/// Default page size sent as `per_page`.
pub const DEFAULT_ITEMS_PER_PAGE: u32 = 100;
/// Default number of retries after the first attempt.
pub const DEFAULT_NUM_RETRIES: u32 = 3;

/// One configuration layer. Every field is optional; unset fields fall
/// through to the next layer.
///
/// Deserializes from TOML:
///
/// ```toml
/// access_token = "1~abc"
/// host = "canvas.example.edu"
/// items_per_page = 50
/// num_retries = 2
/// cache = "memory"
/// cache_mode = "future_cache"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_retries: Option<u32>,
    /// Cache type selector: `none`, `memory` or `session`. Only read when a
    /// client is built; per-call values are ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<String>,
    /// Storage mode for the memory cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_mode: Option<CacheMode>,
}

impl ClientConfig {
    /// Fill every unset field of `self` from `lower`.
    pub fn or(self, lower: &ClientConfig) -> ClientConfig {
        ClientConfig {
            access_token: self.access_token.or_else(|| lower.access_token.clone()),
            host: self.host.or_else(|| lower.host.clone()),
            path_prefix: self.path_prefix.or_else(|| lower.path_prefix.clone()),
            items_per_page: self.items_per_page.or(lower.items_per_page),
            num_retries: self.num_retries.or(lower.num_retries),
            cache: self.cache.or_else(|| lower.cache.clone()),
            cache_mode: self.cache_mode.or(lower.cache_mode),
        }
    }
}

/// Backoff between retry attempts.
///
/// The number of attempts comes from `num_retries`; this only shapes the
/// wait between them. Exponential: `initial_delay * 2^attempt`, capped at
/// `max_delay`. A transport `Retry-After` hint takes precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry. Default: 250ms.
    pub initial_delay: Duration,
    /// Upper bound for any single delay. Default: 5s.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry without waiting.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Delay honouring a server `Retry-After` hint when present.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Global defaults, the lowest configuration layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub host: String,
    pub path_prefix: String,
    pub items_per_page: u32,
    pub num_retries: u32,
    pub retry: RetryPolicy,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            num_retries: DEFAULT_NUM_RETRIES,
            retry: RetryPolicy::default(),
        }
    }
}

/// Fully resolved scalar settings for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub access_token: Option<String>,
    pub host: String,
    pub path_prefix: String,
    pub items_per_page: u32,
    pub num_retries: u32,
}

/// Resolve the three layers into concrete settings.
pub fn resolve(call: &ClientConfig, category: &ClientConfig, defaults: &Defaults) -> Settings {
    Settings {
        access_token: call
            .access_token
            .clone()
            .or_else(|| category.access_token.clone()),
        host: call
            .host
            .clone()
            .or_else(|| category.host.clone())
            .unwrap_or_else(|| defaults.host.clone()),
        path_prefix: call
            .path_prefix
            .clone()
            .or_else(|| category.path_prefix.clone())
            .unwrap_or_else(|| defaults.path_prefix.clone()),
        items_per_page: call
            .items_per_page
            .or(category.items_per_page)
            .unwrap_or(defaults.items_per_page),
        num_retries: call
            .num_retries
            .or(category.num_retries)
            .unwrap_or(defaults.num_retries),
    }
}

/// Build the cache a configuration asks for.
///
/// Fails with `InvalidCacheConfiguration` for an unknown selector, or for
/// `session` without a session store.
pub fn build_cache(
    config: &ClientConfig,
    session: Option<Arc<dyn SessionStore>>,
) -> Result<Option<Arc<dyn Cache>>> {
    let selector: CacheSelector = config.cache.as_deref().unwrap_or("none").parse()?;
    let mode = config.cache_mode.unwrap_or_default();
    match selector {
        CacheSelector::None => Ok(None),
        CacheSelector::Memory => Ok(Some(Arc::new(MemoryCache::new(mode)))),
        CacheSelector::Session => {
            let session = session.ok_or_else(|| {
                crate::LecternError::InvalidCacheConfiguration(
                    "session cache requested without a session store".into(),
                )
            })?;
            if mode == CacheMode::FutureCache {
                return Err(crate::LecternError::InvalidCacheConfiguration(
                    "session cache can only store values".into(),
                ));
            }
            Ok(Some(Arc::new(SessionCache::new(session))))
        }
    }
}

/// Everything one call needs: resolved settings plus the tree's shared
/// handles. Immutable; per-call variants are derived with
/// [`for_call()`](Self::for_call).
#[derive(Clone)]
pub struct EffectiveConfig {
    pub settings: Settings,
    pub retry: RetryPolicy,
    pub transport: Arc<dyn Transport>,
    pub cache: Option<Arc<dyn Cache>>,
    layer: Arc<ClientConfig>,
    defaults: Arc<Defaults>,
}

impl EffectiveConfig {
    /// Resolve the tree-level configuration with no per-call overrides.
    pub fn new(
        layer: ClientConfig,
        defaults: Defaults,
        transport: Arc<dyn Transport>,
        cache: Option<Arc<dyn Cache>>,
    ) -> Self {
        let settings = resolve(&ClientConfig::default(), &layer, &defaults);
        Self {
            settings,
            retry: defaults.retry.clone(),
            transport,
            cache,
            layer: Arc::new(layer),
            defaults: Arc::new(defaults),
        }
    }

    /// Derive the configuration for one call.
    pub fn for_call(&self, overrides: &ClientConfig) -> Self {
        Self {
            settings: resolve(overrides, &self.layer, &self.defaults),
            ..self.clone()
        }
    }

    /// The layer the tree was built with.
    pub fn layer(&self) -> &ClientConfig {
        &self.layer
    }

    /// Logical path for an endpoint path: prefix + path.
    pub fn api_path(&self, path: &str) -> String {
        join_path(&self.settings.path_prefix, path)
    }

    /// Absolute URL for a logical path (as returned by
    /// [`api_path()`](Self::api_path)).
    pub fn url_for(&self, api_path: &str) -> String {
        let host = self.settings.host.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            format!("{host}{api_path}")
        } else {
            format!("https://{host}{api_path}")
        }
    }
}

impl std::fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("host", &self.settings.host)
            .field("path_prefix", &self.settings.path_prefix)
            .field("items_per_page", &self.settings.items_per_page)
            .field("num_retries", &self.settings.num_retries)
            .field("has_token", &self.settings.access_token.is_some())
            .field("cache", &self.cache.as_ref().map(|c| c.mode()))
            .finish()
    }
}

/// Join a prefix and a path with exactly one slash between them.
pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        if prefix.is_empty() {
            "/".to_string()
        } else {
            prefix.to_string()
        }
    } else if prefix.is_empty() {
        format!("/{path}")
    } else if prefix.starts_with('/') {
        format!("{prefix}/{path}")
    } else {
        format!("/{prefix}/{path}")
    }
}
