//! Retry loop around a single physical request.

use tracing::warn;

use crate::config::RetryPolicy;
use crate::telemetry;
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::{LecternError, Result};

/// Send one request, retrying transient failures.
///
/// `num_retries` counts retries after the first attempt, so the transport
/// sees at most `num_retries + 1` calls. Permanent errors return after the
/// attempt that produced them. Either way the caller gets `RequestFailed`
/// carrying the last failure and how many attempts were made.
pub(crate) async fn send_with_retry(
    transport: &dyn Transport,
    policy: &RetryPolicy,
    num_retries: u32,
    request: &TransportRequest,
) -> Result<TransportResponse> {
    let max_attempts = num_retries.saturating_add(1);
    let method = request.method.as_str();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match transport.send_request(request.clone()).await {
            Ok(response) => {
                metrics::counter!(telemetry::REQUESTS_TOTAL, "method" => method, "status" => "ok")
                    .increment(1);
                return Ok(response);
            }
            Err(e) => {
                metrics::counter!(telemetry::REQUESTS_TOTAL, "method" => method, "status" => "error")
                    .increment(1);
                if !e.is_transient() || attempt >= max_attempts {
                    return Err(LecternError::RequestFailed {
                        attempts: attempt,
                        source: e,
                    });
                }
                metrics::counter!(telemetry::RETRIES_TOTAL, "method" => method).increment(1);
                let delay = policy.effective_delay(attempt - 1, e.retry_after());
                warn!(
                    method,
                    url = %request.url,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying after transient error"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
