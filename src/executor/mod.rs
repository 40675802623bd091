//! Request executor.
//!
//! [`Executor::visit`] runs one logical request: cache pre-check, token
//! injection, retrying dispatch and pagination follow, then cache
//! population. [`Executor::settle`] applies an endpoint's invalidation set
//! and strips it from the result.
//!
//! # Cache interaction
//!
//! Only GET requests touch the cache. With [`CacheMode::ValueCache`] the
//! finished payload is stored after a miss. With [`CacheMode::FutureCache`]
//! the request future itself is stored before it runs, so concurrent
//! callers for the same key share one transport call. Whichever waiter
//! sees a failure evicts the entry, provided it still holds that same
//! request, so a caller that gave up early cannot leave the error cached.
//!
//! Cache backend errors never fail a request: reads degrade to misses and
//! failed writes or deletes are logged and counted.

mod pagination;
mod retry;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheEntry, CacheMode, SharedResponse, cache_key, resolve_invalidation};
use crate::config::EffectiveConfig;
use crate::telemetry;
use crate::transport::TransportRequest;
use crate::types::{EndpointOutput, Method, Params};
use crate::Result;

/// Executes requests for one resolved configuration.
#[derive(Clone, Debug)]
pub struct Executor {
    config: EffectiveConfig,
}

impl Executor {
    pub fn new(config: EffectiveConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EffectiveConfig {
        &self.config
    }

    /// Run one logical request against an endpoint path (relative to the
    /// API prefix) and return the fully assembled payload.
    #[instrument(name = "lectern.visit", skip(self, params))]
    pub async fn visit(&self, method: Method, path: &str, params: Params) -> Result<Value> {
        let api_path = self.config.api_path(path);
        let cache = match &self.config.cache {
            Some(cache) if method.is_read() => cache.clone(),
            _ => return self.clone().fetch(method, api_path, params).await,
        };

        let key = cache_key(method, &api_path, &params);
        let mode = cache.mode();
        match mode {
            CacheMode::ValueCache => {
                match cache.get(&key).await {
                    Ok(Some(entry)) => {
                        record_lookup(mode, true);
                        debug!(%key, "cache hit");
                        return entry.resolve().await;
                    }
                    Ok(None) => record_lookup(mode, false),
                    Err(e) => {
                        record_lookup(mode, false);
                        warn!(%key, error = %e, "cache read failed, treating as miss");
                    }
                }
                let value = self.clone().fetch(method, api_path, params).await?;
                if let Err(e) = cache.set(&key, CacheEntry::Ready(value.clone())).await {
                    warn!(%key, error = %e, "cache write failed");
                }
                Ok(value)
            }
            CacheMode::FutureCache => {
                let pending: SharedResponse =
                    self.clone().fetch(method, api_path, params).boxed().shared();
                let (entry, fresh) = match cache
                    .get_or_insert(&key, CacheEntry::InFlight(pending.clone()))
                    .await
                {
                    Ok(found) => found,
                    Err(e) => {
                        warn!(%key, error = %e, "cache unavailable, sending uncached");
                        return pending.await;
                    }
                };
                record_lookup(mode, !fresh);
                debug!(%key, hit = !fresh, "in-flight cache lookup");

                // Unpolled handle: a Shared that ran to completion no longer
                // compares equal to anything.
                let flight = match &entry {
                    CacheEntry::InFlight(flight) => Some(flight.clone()),
                    CacheEntry::Ready(_) => None,
                };
                let result = entry.resolve().await;
                if result.is_err()
                    && let Some(flight) = flight
                {
                    match cache.evict_failed(&key, &flight).await {
                        Ok(evicted) => debug!(%key, evicted, "failed request settled"),
                        Err(e) => warn!(%key, error = %e, "failed to evict failed request"),
                    }
                }
                result
            }
        }
    }

    /// Apply an endpoint's output: invalidate what it names, return only
    /// the payload.
    pub async fn settle(&self, output: EndpointOutput) -> Result<Value> {
        match output {
            EndpointOutput::Value(value) => Ok(value),
            EndpointOutput::Uncache { response, uncache } => {
                self.invalidate(&uncache).await;
                Ok(response)
            }
        }
    }

    /// Evict every cached key an invalidation set names.
    ///
    /// Wildcards are expanded against the keys present when this is
    /// called. Deletes are best-effort: a failure is logged and counted but
    /// does not undo or fail the mutating call. Returns the number of keys
    /// targeted.
    #[instrument(name = "lectern.invalidate", skip(self, patterns), fields(patterns = patterns.len()))]
    pub async fn invalidate(&self, patterns: &[String]) -> usize {
        let Some(cache) = &self.config.cache else {
            return 0;
        };
        let keys = match cache.list_all_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                metrics::counter!(telemetry::INVALIDATION_FAILURES_TOTAL).increment(1);
                warn!(error = %e, "could not list cache keys, nothing invalidated");
                return 0;
            }
        };
        let doomed = resolve_invalidation(patterns, &keys);
        if doomed.is_empty() {
            return 0;
        }
        debug!(keys = ?doomed, "invalidating");
        if let Err(e) = cache.delete_many(&doomed).await {
            metrics::counter!(telemetry::INVALIDATION_FAILURES_TOTAL).increment(1);
            warn!(error = %e, "cache invalidation partially failed");
        }
        metrics::counter!(telemetry::CACHE_INVALIDATIONS_TOTAL).increment(doomed.len() as u64);
        doomed.len()
    }

    /// Token injection, page size, then retrying paginated dispatch.
    async fn fetch(self, method: Method, api_path: String, mut params: Params) -> Result<Value> {
        let settings = &self.config.settings;
        if let Some(token) = &settings.access_token {
            params
                .entry("access_token")
                .or_insert_with(|| Value::String(token.clone()));
        }
        if method.is_read() {
            params
                .entry("per_page")
                .or_insert_with(|| Value::from(settings.items_per_page));
        }
        let request = TransportRequest::new(method, self.config.url_for(&api_path)).params(params);
        pagination::collect_pages(&self.config, request).await
    }
}

fn record_lookup(mode: CacheMode, hit: bool) {
    let name = if hit {
        telemetry::CACHE_HITS_TOTAL
    } else {
        telemetry::CACHE_MISSES_TOTAL
    };
    metrics::counter!(name, "mode" => mode.label()).increment(1);
}
