//! Category tree.
//!
//! Categories live in an arena owned by [`ApiTree`]; nodes refer to their
//! parent and to the root by [`NodeId`], so navigating up or across the
//! tree never needs shared ownership between nodes. The root is always
//! [`NodeId::ROOT`].

mod descriptor;

pub use descriptor::{CategoryDescriptor, Member};

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::EffectiveConfig;
use crate::endpoint::{Operation, bind};
use crate::{LecternError, Result};

/// Index of a category node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// One category.
#[derive(Debug)]
pub struct CategoryNode {
    pub(crate) name: String,
    /// Dotted path from the root, empty for the root itself.
    pub(crate) path: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) operations: BTreeMap<String, Operation>,
}

impl CategoryNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// All categories of one client plus the configuration they share.
#[derive(Debug)]
pub struct ApiTree {
    nodes: Vec<CategoryNode>,
    config: EffectiveConfig,
}

impl ApiTree {
    /// Build the tree rooted at `descriptor`.
    pub fn build(
        descriptor: CategoryDescriptor,
        root_name: impl Into<String>,
        config: EffectiveConfig,
    ) -> Result<Self> {
        let mut tree = Self {
            nodes: vec![CategoryNode {
                name: root_name.into(),
                path: String::new(),
                parent: None,
                children: BTreeMap::new(),
                operations: BTreeMap::new(),
            }],
            config,
        };
        tree.populate(NodeId::ROOT, descriptor)?;
        debug!(
            categories = tree.nodes.len(),
            operations = tree.nodes.iter().map(|n| n.operations.len()).sum::<usize>(),
            "api tree built"
        );
        Ok(tree)
    }

    fn populate(&mut self, id: NodeId, descriptor: CategoryDescriptor) -> Result<()> {
        for (name, member) in descriptor.members {
            if name.is_empty() || name.contains('.') {
                return Err(LecternError::Configuration(format!(
                    "member name '{name}' must be non-empty and must not contain '.'"
                )));
            }
            match member {
                Member::Endpoint(def) => {
                    let operation = bind(name.clone(), def, id)?;
                    self.nodes[id.0].operations.insert(name, operation);
                }
                Member::Category(child) => {
                    let parent_path = &self.nodes[id.0].path;
                    let path = if parent_path.is_empty() {
                        name.clone()
                    } else {
                        format!("{parent_path}.{name}")
                    };
                    let child_id = NodeId(self.nodes.len());
                    self.nodes.push(CategoryNode {
                        name: name.clone(),
                        path,
                        parent: Some(id),
                        children: BTreeMap::new(),
                        operations: BTreeMap::new(),
                    });
                    self.nodes[id.0].children.insert(name, child_id);
                    self.populate(child_id, child)?;
                }
            }
        }
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&CategoryNode> {
        self.nodes.get(id.0)
    }

    pub fn root(&self) -> &CategoryNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &CategoryNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Resolve a dotted category path; the empty string is the root.
    pub fn find_category(&self, dotted: &str) -> Option<NodeId> {
        if dotted.is_empty() {
            return Some(NodeId::ROOT);
        }
        dotted.split('.').try_fold(NodeId::ROOT, |id, segment| {
            self.nodes[id.0].children.get(segment).copied()
        })
    }

    /// Resolve a dotted operation path, e.g. `courses.assignments.list`.
    pub fn find_operation(&self, dotted: &str) -> Option<&Operation> {
        let (category, name) = match dotted.rsplit_once('.') {
            Some((category, name)) => (category, name),
            None => ("", dotted),
        };
        let id = self.find_category(category)?;
        self.nodes[id.0].operations.get(name)
    }
}

impl std::ops::Index<NodeId> for ApiTree {
    type Output = CategoryNode;

    /// # Panics
    ///
    /// If `id` was issued by a different tree.
    fn index(&self, id: NodeId) -> &CategoryNode {
        &self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::config::{ClientConfig, Defaults};
    use crate::endpoint::EndpointDef;
    use crate::error::TransportError;
    use crate::transport::{Transport, TransportRequest, TransportResponse};

    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn send_request(
            &self,
            _request: TransportRequest,
        ) -> std::result::Result<TransportResponse, TransportError> {
            Err(TransportError::Network("offline".into()))
        }
    }

    fn config() -> EffectiveConfig {
        EffectiveConfig::new(
            ClientConfig::default(),
            Defaults::default(),
            Arc::new(Unreachable),
            None,
        )
    }

    fn catalogue() -> CategoryDescriptor {
        CategoryDescriptor::new()
            .category(
                "courses",
                CategoryDescriptor::new()
                    .endpoint("get", EndpointDef::get("get a course", "/courses/{course_id}"))
                    .category(
                        "assignments",
                        CategoryDescriptor::new().endpoint(
                            "list",
                            EndpointDef::get("list assignments", "/courses/{course_id}/assignments"),
                        ),
                    ),
            )
            .endpoint("whoami", EndpointDef::get("get the current user", "/users/self"))
    }

    #[test]
    fn builds_arena_with_parents_and_paths() {
        let tree = ApiTree::build(catalogue(), "canvas", config()).unwrap();
        let assignments = tree.find_category("courses.assignments").unwrap();
        let node = tree.node(assignments).unwrap();
        assert_eq!(node.path(), "courses.assignments");
        let parent = tree.node(node.parent().unwrap()).unwrap();
        assert_eq!(parent.name(), "courses");
        assert_eq!(parent.parent(), Some(NodeId::ROOT));
        assert_eq!(tree.root().name(), "canvas");
    }

    #[test]
    fn finds_operations_by_dotted_path() {
        let tree = ApiTree::build(catalogue(), "canvas", config()).unwrap();
        assert_eq!(
            tree.find_operation("courses.assignments.list").unwrap().action(),
            "list assignments"
        );
        assert!(tree.find_operation("whoami").is_some());
        assert!(tree.find_operation("courses.nope").is_none());
        assert!(tree.find_operation("nope.get").is_none());
    }

    #[test]
    fn placeholders_become_required() {
        let tree = ApiTree::build(catalogue(), "canvas", config()).unwrap();
        let op = tree.find_operation("courses.get").unwrap();
        assert_eq!(op.required_params(), ["course_id".to_string()]);
    }

    #[test]
    fn dotted_member_names_are_rejected() {
        let bad = CategoryDescriptor::new().endpoint("a.b", EndpointDef::get("x", "/x"));
        assert!(ApiTree::build(bad, "canvas", config()).is_err());
    }
}
