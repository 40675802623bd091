//! Per-call options

use serde_json::Value;

use crate::config::ClientConfig;

/// Request parameters, keyed by name.
///
/// `serde_json::Map` keeps keys sorted, which makes cache keys canonical.
pub type Params = serde_json::Map<String, Value>;

/// Options for a single operation invocation.
///
/// `params` feed the endpoint (path placeholders, query or body);
/// `overrides` win over the tree's configuration for this call only.
///
/// ```rust
/// # use lectern::CallOptions;
/// let opts = CallOptions::new()
///     .param("course_id", 42)
///     .param("include", vec!["submission"])
///     .items_per_page(50);
/// assert_eq!(opts.params["course_id"], 42);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub params: Params,
    pub overrides: ClientConfig,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Replace all parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.overrides.access_token = Some(token.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.overrides.host = Some(host.into());
        self
    }

    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.overrides.path_prefix = Some(prefix.into());
        self
    }

    pub fn items_per_page(mut self, n: u32) -> Self {
        self.overrides.items_per_page = Some(n);
        self
    }

    pub fn num_retries(mut self, n: u32) -> Self {
        self.overrides.num_retries = Some(n);
        self
    }
}

impl From<Params> for CallOptions {
    fn from(params: Params) -> Self {
        Self {
            params,
            overrides: ClientConfig::default(),
        }
    }
}
