//! Endpoint return shapes

use serde_json::Value;

/// What an endpoint's `run` hands back to the executor.
///
/// Mutating endpoints return [`EndpointOutput::Uncache`] to name the cache
/// paths their success makes stale. Entries ending in `*` are prefix
/// patterns. The invalidation set is never part of the caller's result.
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointOutput {
    /// Plain payload, nothing to invalidate.
    Value(Value),
    /// Payload plus the paths to evict from the cache.
    Uncache { response: Value, uncache: Vec<String> },
}

impl EndpointOutput {
    /// Wrap a payload together with its invalidation set.
    pub fn uncache<I, S>(response: Value, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Uncache {
            response,
            uncache: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// The payload, regardless of shape.
    pub fn response(&self) -> &Value {
        match self {
            Self::Value(v) => v,
            Self::Uncache { response, .. } => response,
        }
    }
}

impl From<Value> for EndpointOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}
