//! HTTP method type

use serde::{Deserialize, Serialize};

/// HTTP methods an endpoint can be dispatched with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Canonical upper-case name, as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Read-only requests are the only ones served from or stored in the cache.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Get)
    }

    /// Methods that change server state and may carry an invalidation set.
    pub fn is_mutating(&self) -> bool {
        !self.is_read()
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = crate::LecternError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(crate::LecternError::Configuration(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}
