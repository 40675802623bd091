//! Following continuations until a logical result is complete.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::retry::send_with_retry;
use crate::config::EffectiveConfig;
use crate::telemetry;
use crate::transport::TransportRequest;
use crate::types::Params;
use crate::{LecternError, Result};

/// Fetch `first` and every page it links to, strictly in order.
///
/// A single-page response is returned as-is. When a continuation is
/// present every page must be a list; the lists are concatenated in
/// arrival order. Continuation requests re-send only the access token,
/// the rest of the query is carried by the continuation URL.
pub(crate) async fn collect_pages(
    config: &EffectiveConfig,
    first: TransportRequest,
) -> Result<Value> {
    let transport = config.transport.as_ref();
    let retries = config.settings.num_retries;

    let response = send_with_retry(transport, &config.retry, retries, &first).await?;
    let Some(mut next) = response.continuation else {
        return Ok(response.data);
    };

    let mut carried = Params::new();
    if let Some(token) = first.params.get("access_token") {
        carried.insert("access_token".into(), token.clone());
    }

    let mut seen = HashSet::from([first.url.clone()]);
    let mut items = page_items(response.data, 1)?;
    let mut page = 1;
    loop {
        page += 1;
        if !seen.insert(next.clone()) {
            return Err(LecternError::MalformedResponse(format!(
                "pagination loop: page {page} points back at {next}"
            )));
        }
        debug!(page, url = %next, "following continuation");
        metrics::counter!(telemetry::PAGES_TOTAL).increment(1);

        let request = TransportRequest {
            method: first.method,
            url: next,
            params: carried.clone(),
            headers: first.headers.clone(),
        };
        let response = send_with_retry(transport, &config.retry, retries, &request).await?;
        items.extend(page_items(response.data, page)?);
        match response.continuation {
            Some(url) => next = url,
            None => break,
        }
    }
    debug!(pages = page, items = items.len(), "pagination complete");
    Ok(Value::Array(items))
}

fn page_items(data: Value, page: usize) -> Result<Vec<Value>> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(LecternError::MalformedResponse(format!(
            "page {page} of a paginated response is not a list: {}",
            truncate(&other.to_string())
        ))),
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(120).collect()
}
