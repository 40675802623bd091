//! Endpoint binder.
//!
//! An [`EndpointDef`] is pure data: action label, HTTP method, path
//! template, required parameters and the cache paths a successful call
//! invalidates. [`bind`] turns one into an [`Operation`] that validates its
//! parameters, resolves the per-call configuration and runs through the
//! [`Executor`].
//!
//! Endpoints that need more than a single request (composition, reshaping,
//! calling other operations) supply an [`EndpointHandler`] instead of
//! relying on the declarative default.

mod template;

pub use template::{placeholders, render};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::api::Api;
use crate::config::{ClientConfig, EffectiveConfig, join_path};
use crate::executor::Executor;
use crate::tree::NodeId;
use crate::types::{CallOptions, EndpointOutput, Method, Params};
use crate::{LecternError, Result};

/// Custom endpoint logic.
///
/// Return [`EndpointOutput::Uncache`] to invalidate cache paths after a
/// successful mutation. Errors raised here (e.g.
/// [`LecternError::MalformedResponse`]) reach the caller unchanged.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    async fn run(&self, ctx: &EndpointContext, params: &Params) -> Result<EndpointOutput>;
}

/// Declarative endpoint description.
///
/// ```rust
/// # use lectern::EndpointDef;
/// let def = EndpointDef::post("create an assignment", "/courses/{course_id}/assignments")
///     .required(["assignment"])
///     .uncache(["/courses/{course_id}/assignments*"]);
/// assert_eq!(def.required_params, vec!["assignment".to_string()]);
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct EndpointDef {
    /// Human-readable description, e.g. "get info on a course".
    pub action: String,
    #[serde(default)]
    pub method: Method,
    /// Path template relative to the API prefix.
    #[serde(default)]
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_params: Vec<String>,
    /// Path templates (relative to the API prefix, `*` suffix for prefixes)
    /// to invalidate after a successful mutating call.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncache: Vec<String>,
    #[serde(skip)]
    pub handler: Option<Arc<dyn EndpointHandler>>,
}

impl EndpointDef {
    pub fn new(action: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(action: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(action, Method::Get, path)
    }

    pub fn post(action: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(action, Method::Post, path)
    }

    pub fn put(action: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(action, Method::Put, path)
    }

    pub fn patch(action: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(action, Method::Patch, path)
    }

    pub fn delete(action: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(action, Method::Delete, path)
    }

    /// An endpoint driven entirely by custom logic.
    pub fn custom(action: impl Into<String>, handler: impl EndpointHandler + 'static) -> Self {
        Self {
            action: action.into(),
            handler: Some(Arc::new(handler)),
            ..Default::default()
        }
    }

    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_params = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn uncache<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.uncache = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn handler(mut self, handler: impl EndpointHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }
}

impl std::fmt::Debug for EndpointDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDef")
            .field("action", &self.action)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("required_params", &self.required_params)
            .field("uncache", &self.uncache)
            .field("custom", &self.handler.is_some())
            .finish()
    }
}

/// What a handler sees while it runs.
pub struct EndpointContext {
    api: Api,
    executor: Executor,
    overrides: ClientConfig,
    action: String,
}

impl EndpointContext {
    /// Root of the tree the operation belongs to.
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// Configuration resolved for this call.
    pub fn config(&self) -> &EffectiveConfig {
        self.executor.config()
    }

    /// Action label of the running operation.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Issue a request relative to the API prefix, through the cache.
    pub async fn visit(&self, method: Method, path: &str, params: Params) -> Result<Value> {
        self.executor.visit(method, path, params).await
    }

    pub async fn get(&self, path: &str, params: Params) -> Result<Value> {
        self.visit(Method::Get, path, params).await
    }

    /// Call another operation in the tree by dotted path, carrying this
    /// call's configuration overrides.
    pub async fn call(&self, operation: &str, params: Params) -> Result<Value> {
        let options = CallOptions {
            params,
            overrides: self.overrides.clone(),
        };
        self.api.call(operation, options).await
    }

    /// Absolute cache path for an endpoint path, for building invalidation
    /// sets (`ctx.api_path("/courses/1/*")`).
    pub fn api_path(&self, path: &str) -> String {
        self.config().api_path(path)
    }
}

/// An endpoint bound to a category node.
#[derive(Clone, Debug)]
pub struct Operation {
    name: String,
    node: NodeId,
    def: EndpointDef,
    required: Vec<String>,
}

/// Bind a descriptor to its owning node.
///
/// Path placeholders are added to the declared required parameters, so a
/// call can never reach the executor with an unrenderable path.
pub fn bind(name: impl Into<String>, def: EndpointDef, node: NodeId) -> Result<Operation> {
    let mut required = def.required_params.clone();
    if def.handler.is_none() {
        for name in placeholders(&def.path)? {
            if !required.contains(&name) {
                required.push(name);
            }
        }
        for pattern in &def.uncache {
            placeholders(pattern)?;
        }
    }
    Ok(Operation {
        name: name.into(),
        node,
        def,
        required,
    })
}

impl Operation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &str {
        &self.def.action
    }

    pub fn method(&self) -> Method {
        self.def.method
    }

    pub fn path_template(&self) -> &str {
        &self.def.path
    }

    /// Required parameters, declared ones first.
    pub fn required_params(&self) -> &[String] {
        &self.required
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_custom(&self) -> bool {
        self.def.handler.is_some()
    }

    /// Required parameters absent (or null) in `params`.
    pub fn missing_params(&self, params: &Params) -> Vec<String> {
        self.required
            .iter()
            .filter(|name| params.get(name.as_str()).is_none_or(Value::is_null))
            .cloned()
            .collect()
    }

    /// Validate, resolve configuration, run, settle.
    #[instrument(name = "lectern.operation", skip_all, fields(action = %self.def.action))]
    pub(crate) async fn invoke(&self, api: &Api, options: CallOptions) -> Result<Value> {
        let missing = self.missing_params(&options.params);
        if !missing.is_empty() {
            return Err(LecternError::missing(&self.def.action, missing));
        }

        let config = api.config().for_call(&options.overrides);
        let ctx = EndpointContext {
            api: api.clone(),
            executor: Executor::new(config),
            overrides: options.overrides,
            action: self.def.action.clone(),
        };

        let output = match &self.def.handler {
            Some(handler) => handler.run(&ctx, &options.params).await?,
            None => self.run_declarative(&ctx, &options.params).await?,
        };
        ctx.executor.settle(output).await
    }

    async fn run_declarative(&self, ctx: &EndpointContext, params: &Params) -> Result<EndpointOutput> {
        let (path, rest) = render(&self.def.path, params, &self.def.action)?;
        let response = ctx.visit(self.def.method, &path, rest).await?;
        if !self.def.method.is_mutating() || self.def.uncache.is_empty() {
            return Ok(EndpointOutput::Value(response));
        }

        let prefix = &ctx.config().settings.path_prefix;
        let mut uncache = Vec::with_capacity(self.def.uncache.len());
        for pattern in &self.def.uncache {
            let (rendered, _) = render(pattern, params, &self.def.action)?;
            uncache.push(join_path(prefix, &rendered));
        }
        Ok(EndpointOutput::Uncache { response, uncache })
    }
}
