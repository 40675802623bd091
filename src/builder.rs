//! Builder for configured clients

use std::sync::Arc;

use tracing::debug;

use crate::api::Api;
use crate::cache::{Cache, CacheMode, SessionStore};
use crate::config::{ClientConfig, Defaults, EffectiveConfig, RetryPolicy, build_cache};
use crate::transport::Transport;
use crate::tree::{ApiTree, CategoryDescriptor};
use crate::{LecternError, Result};

/// Default name of the root category.
pub const DEFAULT_ROOT_NAME: &str = "canvas";

/// Main entry point for creating clients.
pub struct Lectern;

impl Lectern {
    /// Create a new builder for configuring a client.
    pub fn builder() -> LecternBuilder {
        LecternBuilder::new()
    }
}

/// Builder for configured clients.
///
/// ```rust,no_run
/// # fn demo() -> lectern::Result<()> {
/// use lectern::{CategoryDescriptor, EndpointDef, Lectern};
///
/// let api = Lectern::builder()
///     .host("school.instructure.com")
///     .access_token("secret")
///     .cache("memory")
///     .catalogue(
///         CategoryDescriptor::new()
///             .endpoint("whoami", EndpointDef::get("get the current user", "/users/self")),
///     )
///     .build()?;
/// # let _ = api;
/// # Ok(())
/// # }
/// ```
pub struct LecternBuilder {
    config: ClientConfig,
    defaults: Defaults,
    transport: Option<Arc<dyn Transport>>,
    session: Option<Arc<dyn SessionStore>>,
    cache_backend: Option<Arc<dyn Cache>>,
    catalogue: CategoryDescriptor,
    root_name: String,
}

impl LecternBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            defaults: Defaults::default(),
            transport: None,
            session: None,
            cache_backend: None,
            catalogue: CategoryDescriptor::default(),
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }

    /// Start from a loaded configuration layer. Setters called afterwards
    /// override its fields.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = Some(token.into());
        self
    }

    /// Host, with or without scheme (`https://` is assumed).
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.path_prefix = Some(prefix.into());
        self
    }

    pub fn items_per_page(mut self, n: u32) -> Self {
        self.config.items_per_page = Some(n);
        self
    }

    pub fn num_retries(mut self, n: u32) -> Self {
        self.config.num_retries = Some(n);
        self
    }

    /// Cache selector: `none`, `memory` or `session`.
    pub fn cache(mut self, selector: impl Into<String>) -> Self {
        self.config.cache = Some(selector.into());
        self
    }

    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.config.cache_mode = Some(mode);
        self
    }

    /// Session context backing the `session` cache selector.
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session = Some(store);
        self
    }

    /// Use a ready-made cache, ignoring the selector.
    pub fn cache_backend(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache_backend = Some(cache);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.defaults.retry = policy;
        self
    }

    /// Replace the global defaults (lowest configuration layer).
    pub fn defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn catalogue(mut self, catalogue: CategoryDescriptor) -> Self {
        self.catalogue = catalogue;
        self
    }

    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the cache selector is unknown or unusable (`InvalidCacheConfiguration`)
    /// - `items_per_page` is zero
    /// - no transport was given and the `http` feature is disabled
    /// - the catalogue contains invalid names or path templates
    pub fn build(self) -> Result<Api> {
        if self.config.items_per_page == Some(0) || self.defaults.items_per_page == 0 {
            return Err(LecternError::Configuration(
                "items_per_page must be at least 1".into(),
            ));
        }

        let cache = match self.cache_backend {
            Some(cache) => Some(cache),
            None => build_cache(&self.config, self.session)?,
        };
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport()?,
        };

        debug!(
            host = ?self.config.host,
            cache = cache.as_ref().map(|c| c.mode().label()),
            "building client"
        );
        let config = EffectiveConfig::new(self.config, self.defaults, transport, cache);
        let tree = ApiTree::build(self.catalogue, self.root_name, config)?;
        Ok(Api::new(tree))
    }
}

impl Default for LecternBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::HttpTransport::new()?))
}

#[cfg(not(feature = "http"))]
fn default_transport() -> Result<Arc<dyn Transport>> {
    Err(LecternError::Configuration(
        "no transport configured and the `http` feature is disabled".into(),
    ))
}
