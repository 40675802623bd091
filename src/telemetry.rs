//! Telemetry metric name constants.
//!
//! Centralised metric names for lectern operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `lectern_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `method`: HTTP method of the physical request (e.g. "GET")
//! - `status`: outcome: "ok" or "error"
//! - `mode`: cache storage mode: "value" or "future"

/// Total physical requests handed to the transport (every attempt, every page).
///
/// Labels: `method`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "lectern_requests_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `method`.
pub const RETRIES_TOTAL: &str = "lectern_retries_total";

/// Total continuation pages followed (not counting the first page).
pub const PAGES_TOTAL: &str = "lectern_pages_total";

/// Total cache hits.
///
/// Labels: `mode`.
pub const CACHE_HITS_TOTAL: &str = "lectern_cache_hits_total";

/// Total cache misses.
///
/// Labels: `mode`.
pub const CACHE_MISSES_TOTAL: &str = "lectern_cache_misses_total";

/// Total cache keys evicted by invalidation sets.
pub const CACHE_INVALIDATIONS_TOTAL: &str = "lectern_cache_invalidations_total";

/// Total invalidation deletes that failed in the backing store.
pub const INVALIDATION_FAILURES_TOTAL: &str = "lectern_invalidation_failures_total";
