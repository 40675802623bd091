//! Public handle onto a built category tree.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::config::EffectiveConfig;
use crate::endpoint::Operation;
use crate::executor::Executor;
use crate::tree::{ApiTree, CategoryNode, NodeId};
use crate::types::{CallOptions, Method};
use crate::{LecternError, Result};

/// A built client. Cheap to clone; clones share the tree, the transport and
/// the cache.
#[derive(Clone, Debug)]
pub struct Api {
    tree: Arc<ApiTree>,
}

/// Summary of one operation, as listed by [`Api::operations`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationInfo {
    /// Dotted path, e.g. `courses.assignments.list`.
    pub path: String,
    pub action: String,
    pub method: Method,
    pub path_template: String,
    pub required_params: Vec<String>,
    pub custom: bool,
}

impl Api {
    pub(crate) fn new(tree: ApiTree) -> Self {
        Self {
            tree: Arc::new(tree),
        }
    }

    /// The root category.
    pub fn root(&self) -> Category {
        Category {
            api: self.clone(),
            id: NodeId::ROOT,
        }
    }

    /// A category by dotted path (`""` is the root).
    pub fn category(&self, dotted: &str) -> Option<Category> {
        self.tree.find_category(dotted).map(|id| Category {
            api: self.clone(),
            id,
        })
    }

    /// An operation by dotted path.
    pub fn operation(&self, dotted: &str) -> Result<OperationRef> {
        let op = self
            .tree
            .find_operation(dotted)
            .ok_or_else(|| LecternError::UnknownOperation(dotted.to_string()))?;
        Ok(OperationRef {
            api: self.clone(),
            op: op.clone(),
        })
    }

    /// Invoke an operation by dotted path.
    ///
    /// ```rust,no_run
    /// # async fn demo(api: lectern::Api) -> lectern::Result<()> {
    /// use lectern::CallOptions;
    ///
    /// let course = api
    ///     .call("courses.get", CallOptions::new().param("course_id", 42))
    ///     .await?;
    /// # let _ = course;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(name = "lectern.call", skip(self, options))]
    pub async fn call(&self, operation: &str, options: impl Into<CallOptions>) -> Result<Value> {
        let op = self
            .tree
            .find_operation(operation)
            .ok_or_else(|| LecternError::UnknownOperation(operation.to_string()))?;
        op.invoke(self, options.into()).await
    }

    /// Evict cached responses whose paths match `patterns` (absolute API
    /// paths, `*` suffix for prefixes). Returns the number of keys targeted.
    pub async fn uncache<I, S>(&self, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        Executor::new(self.config().clone())
            .invalidate(&patterns)
            .await
    }

    /// The tree-level configuration.
    pub fn config(&self) -> &EffectiveConfig {
        self.tree.config()
    }

    /// Every operation in the tree, sorted by dotted path.
    pub fn operations(&self) -> Vec<OperationInfo> {
        let mut out = Vec::new();
        for (_, node) in self.tree.nodes() {
            for (name, op) in &node.operations {
                let path = if node.path.is_empty() {
                    name.clone()
                } else {
                    format!("{}.{name}", node.path)
                };
                out.push(OperationInfo {
                    path,
                    action: op.action().to_string(),
                    method: op.method(),
                    path_template: op.path_template().to_string(),
                    required_params: op.required_params().to_vec(),
                    custom: op.is_custom(),
                });
            }
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }

    /// `Category` ids are only ever issued by this tree.
    fn node(&self, id: NodeId) -> &CategoryNode {
        &self.tree[id]
    }
}

/// A category within a built tree.
#[derive(Clone, Debug)]
pub struct Category {
    api: Api,
    id: NodeId,
}

impl Category {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.api.node(self.id).name()
    }

    /// Dotted path from the root, empty for the root.
    pub fn path(&self) -> &str {
        self.api.node(self.id).path()
    }

    pub fn parent(&self) -> Option<Category> {
        self.api.node(self.id).parent().map(|id| Category {
            api: self.api.clone(),
            id,
        })
    }

    pub fn root(&self) -> Category {
        self.api.root()
    }

    pub fn child(&self, name: &str) -> Option<Category> {
        self.api
            .node(self.id)
            .children
            .get(name)
            .map(|&id| Category {
                api: self.api.clone(),
                id,
            })
    }

    pub fn operation(&self, name: &str) -> Option<OperationRef> {
        let op = self.api.node(self.id).operations.get(name)?;
        Some(OperationRef {
            api: self.api.clone(),
            op: op.clone(),
        })
    }

    pub fn child_names(&self) -> Vec<&str> {
        self.api
            .node(self.id)
            .children
            .keys()
            .map(String::as_str)
            .collect()
    }

    pub fn operation_names(&self) -> Vec<&str> {
        self.api
            .node(self.id)
            .operations
            .keys()
            .map(String::as_str)
            .collect()
    }
}

/// A callable operation within a built tree.
#[derive(Clone, Debug)]
pub struct OperationRef {
    api: Api,
    op: Operation,
}

impl OperationRef {
    pub fn name(&self) -> &str {
        self.op.name()
    }

    pub fn action(&self) -> &str {
        self.op.action()
    }

    pub fn method(&self) -> Method {
        self.op.method()
    }

    pub fn required_params(&self) -> &[String] {
        self.op.required_params()
    }

    pub async fn call(&self, options: impl Into<CallOptions>) -> Result<Value> {
        self.op.invoke(&self.api, options.into()).await
    }
}
