//! reqwest-backed [`Transport`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{Transport, TransportRequest, TransportResponse};
use crate::error::TransportError;
use crate::types::{Method, Params};

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP transport over a shared `reqwest::Client`.
///
/// - GET/DELETE parameters are query-encoded with Canvas conventions
///   (see [`encode_query`]); other methods send a JSON body.
/// - `Link: <...>; rel="next"` becomes the continuation.
/// - Non-2xx statuses become [`TransportError::Status`], connection
///   failures [`TransportError::Network`].
#[derive(Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    /// Build a transport with the default timeout.
    pub fn new() -> crate::Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Build a transport with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> crate::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                crate::LecternError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self { http })
    }

    /// Wrap an existing client (caller manages TLS, proxies, pooling).
    pub fn from_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(name = "http.send", skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send_request(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.method {
            Method::Get | Method::Delete => builder.query(&encode_query(&request.params)),
            _ => builder.json(&request.params),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(TransportError::Status {
                status,
                message: error_message(&body),
                retry_after: retry_after(&headers),
            });
        }

        let data = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))?
        };
        let continuation = headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_link);
        debug!(status, has_next = continuation.is_some(), "response received");

        Ok(TransportResponse {
            status,
            data,
            continuation,
        })
    }
}

/// Flatten parameters into query pairs.
///
/// Arrays become repeated `key[]` pairs, objects become `key[sub]`, nulls
/// are dropped and scalars are rendered as plain strings.
pub fn encode_query(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in params {
        push_pairs(&mut pairs, name.clone(), value);
    }
    pairs
}

fn push_pairs(pairs: &mut Vec<(String, String)>, name: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => pairs.push((name, s.clone())),
        Value::Bool(b) => pairs.push((name, b.to_string())),
        Value::Number(n) => pairs.push((name, n.to_string())),
        Value::Array(items) => {
            let key = format!("{name}[]");
            for item in items {
                push_pairs(pairs, key.clone(), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(pairs, format!("{name}[{sub}]"), item);
            }
        }
    }
}

/// Extract the `rel="next"` target from a `Link` header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == "rel=\"next\"" || p == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Best-effort human message from an error body.
fn error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct CanvasError {
        message: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct CanvasErrors {
        errors: Vec<CanvasError>,
    }

    if let Ok(parsed) = serde_json::from_str::<CanvasErrors>(body)
        && let Some(message) = parsed.errors.into_iter().find_map(|e| e.message)
    {
        return message;
    }
    if let Ok(parsed) = serde_json::from_str::<CanvasError>(body)
        && let Some(message) = parsed.message
    {
        return message;
    }
    body.chars().take(200).collect()
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
