//! Cache key construction and invalidation matching.
//!
//! A key is the logical request path (API prefix + endpoint path) followed
//! by a canonical query of the caller's parameters:
//!
//! ```text
//! /api/v1/courses/42/assignments?include=["submission"]&search_term=quiz
//! ```
//!
//! Keys for methods other than GET carry a `METHOD ` qualifier so they can
//! never collide with the GET entry for the same path. Invalidation
//! patterns are matched against the path component only, so one pattern
//! evicts every parameter variant of a path.

use serde_json::Value;

use crate::types::{Method, Params};

/// Marker that turns an invalidation entry into a prefix pattern.
pub const WILDCARD: char = '*';

/// Build the cache key for a request.
pub fn cache_key(method: Method, path: &str, params: &Params) -> String {
    let mut key = String::with_capacity(path.len() + 16);
    if !method.is_read() {
        key.push_str(method.as_str());
        key.push(' ');
    }
    key.push_str(path);

    if !params.is_empty() {
        let mut names: Vec<&String> = params.keys().collect();
        names.sort();
        key.push('?');
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                key.push('&');
            }
            key.push_str(name);
            key.push('=');
            match &params[name] {
                Value::String(s) => key.push_str(s),
                other => key.push_str(&other.to_string()),
            }
        }
    }
    key
}

/// Path component of a key: method qualifier and query stripped.
pub fn key_path(key: &str) -> &str {
    let without_method = if key.starts_with('/') {
        key
    } else {
        key.split_once(' ').map_or(key, |(_, rest)| rest)
    };
    without_method
        .split_once('?')
        .map_or(without_method, |(path, _)| path)
}

/// Whether an invalidation pattern names a key.
///
/// `P*` matches every key whose path starts with `P`; anything else must
/// equal the key's path exactly.
pub fn pattern_matches(pattern: &str, key: &str) -> bool {
    let path = key_path(key);
    match pattern.strip_suffix(WILDCARD) {
        Some(prefix) => path.starts_with(prefix),
        None => path == pattern,
    }
}

/// Expand an invalidation set against a snapshot of the cache's keys.
///
/// Returns each matching key once, in snapshot order.
pub fn resolve_invalidation(patterns: &[String], keys: &[String]) -> Vec<String> {
    keys.iter()
        .filter(|key| patterns.iter().any(|p| pattern_matches(p, key)))
        .cloned()
        .collect()
}
