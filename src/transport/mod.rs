//! Transport boundary.
//!
//! The core never opens sockets. It hands a fully composed
//! [`TransportRequest`] to a [`Transport`] and gets back either a
//! [`TransportResponse`] or a classified [`TransportError`]. Anything that
//! can send HTTP can sit behind this trait; [`HttpTransport`] is the
//! reqwest-backed default.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpTransport, encode_query, next_link};

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;
use crate::types::{Method, Params};

/// One physical request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Absolute URL. Continuation requests use the URL the previous page
    /// pointed at verbatim.
    pub url: String,
    /// Query parameters for GET, body fields otherwise.
    pub params: Params,
    pub headers: BTreeMap<String, String>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Params::new(),
            headers: BTreeMap::new(),
        }
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// One physical response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub data: Value,
    /// Where the next page lives, if this response is one page of many.
    pub continuation: Option<String>,
}

impl TransportResponse {
    /// A 200 response with no further pages.
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            data,
            continuation: None,
        }
    }

    /// A 200 response that points at a further page.
    pub fn page(data: Value, next: impl Into<String>) -> Self {
        Self {
            status: 200,
            data,
            continuation: Some(next.into()),
        }
    }
}

/// The `send_request` capability the executor depends on.
///
/// Implementations own timeouts and must classify failures: only errors
/// whose [`is_transient()`](TransportError::is_transient) is `true` are
/// retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_request(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}
