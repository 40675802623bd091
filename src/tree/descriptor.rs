//! Serializable catalogue of categories and endpoints.
//!
//! A catalogue can be written inline with the builder methods or loaded
//! from JSON/TOML:
//!
//! ```toml
//! [members.courses]
//! kind = "category"
//!
//! [members.courses.members.get]
//! kind = "endpoint"
//! action = "get info on a course"
//! path = "/courses/{course_id}"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointDef, EndpointHandler};

/// One named member of a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Member {
    Category(CategoryDescriptor),
    Endpoint(EndpointDef),
}

/// A category: nested categories and endpoints, by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryDescriptor {
    #[serde(default)]
    pub members: BTreeMap<String, Member>,
}

impl CategoryDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, name: impl Into<String>, def: EndpointDef) -> Self {
        self.members.insert(name.into(), Member::Endpoint(def));
        self
    }

    pub fn category(mut self, name: impl Into<String>, category: CategoryDescriptor) -> Self {
        self.members.insert(name.into(), Member::Category(category));
        self
    }

    /// Attach custom logic to an endpoint already in the catalogue, e.g.
    /// one loaded from a file. `path` is dotted and relative to this
    /// category. Returns `false` if no endpoint lives there.
    pub fn attach_handler(
        &mut self,
        path: &str,
        handler: impl EndpointHandler + 'static,
    ) -> bool {
        let Some((head, tail)) = path.split_once('.') else {
            return match self.members.get_mut(path) {
                Some(Member::Endpoint(def)) => {
                    def.handler = Some(std::sync::Arc::new(handler));
                    true
                }
                _ => false,
            };
        };
        match self.members.get_mut(head) {
            Some(Member::Category(child)) => child.attach_handler(tail, handler),
            _ => false,
        }
    }

    /// Parse a JSON catalogue.
    pub fn from_json_str(raw: &str) -> crate::Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| crate::LecternError::Configuration(format!("invalid catalogue: {e}")))
    }

    /// Parse a TOML catalogue.
    pub fn from_toml_str(raw: &str) -> crate::Result<Self> {
        toml::from_str(raw)
            .map_err(|e| crate::LecternError::Configuration(format!("invalid catalogue: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;

    #[test]
    fn json_catalogue_parses_nested_members() {
        let catalogue = CategoryDescriptor::from_json_str(
            r#"{
                "members": {
                    "courses": {
                        "kind": "category",
                        "members": {
                            "get": {
                                "kind": "endpoint",
                                "action": "get info on a course",
                                "path": "/courses/{course_id}"
                            },
                            "update": {
                                "kind": "endpoint",
                                "action": "update a course",
                                "method": "PUT",
                                "path": "/courses/{course_id}",
                                "uncache": ["/courses/{course_id}*"]
                            }
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        let Some(Member::Category(courses)) = catalogue.members.get("courses") else {
            panic!("courses should be a category");
        };
        let Some(Member::Endpoint(update)) = courses.members.get("update") else {
            panic!("update should be an endpoint");
        };
        assert_eq!(update.method, Method::Put);
        assert_eq!(update.uncache, vec!["/courses/{course_id}*".to_string()]);
        let Some(Member::Endpoint(get)) = courses.members.get("get") else {
            panic!("get should be an endpoint");
        };
        assert_eq!(get.method, Method::Get);
    }

    #[test]
    fn toml_catalogue_parses() {
        let catalogue = CategoryDescriptor::from_toml_str(
            r#"
            [members.users]
            kind = "category"

            [members.users.members.self]
            kind = "endpoint"
            action = "get the current user"
            path = "/users/self"
            "#,
        )
        .unwrap();
        assert!(matches!(
            catalogue.members.get("users"),
            Some(Member::Category(_))
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = CategoryDescriptor::from_json_str(r#"{"members": {"x": {"kind": "widget"}}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("invalid catalogue"));
    }
}
