use chrono::Utc;
use tracing::{debug, warn};

use crate::fetch::Fetcher;
use crate::request::{Request, Response};
use crate::storage::CacheStorage;
use crate::Result;

/// Only these statuses ever get written to cache: 200, and 0 for opaque
/// cross-origin responses
pub const DEFAULT_CACHEABLE_STATUSES: [u16; 2] = [0, 200];

/// Cache-first with expiry
///
/// Consult the named partition; a fresh hit never touches the network. A
/// miss (or an entry past its max age) goes to the network, and cacheable
/// responses are written back with the current timestamp before being
/// returned. Expiry is evaluated lazily at read time - no background sweep.
#[derive(Debug, Clone)]
pub struct CacheFirst {
    cache_name: String,
    max_age_seconds: i64,
    cacheable_statuses: Vec<u16>,
}

impl CacheFirst {
    pub fn new(cache_name: impl Into<String>, max_age_seconds: i64) -> Self {
        Self {
            cache_name: cache_name.into(),
            max_age_seconds,
            cacheable_statuses: DEFAULT_CACHEABLE_STATUSES.to_vec(),
        }
    }

    pub fn with_cacheable_statuses(mut self, statuses: Vec<u16>) -> Self {
        self.cacheable_statuses = statuses;
        self
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    fn is_fresh(&self, cached_at: i64, now: i64) -> bool {
        now - cached_at <= self.max_age_seconds
    }

    /// Run one request through the strategy.
    pub async fn handle(
        &self,
        storage: &CacheStorage,
        fetcher: &dyn Fetcher,
        request: &Request,
    ) -> Result<Response> {
        let now = Utc::now().timestamp();

        match storage.get(&self.cache_name, &request.url) {
            Ok(Some(entry)) if self.is_fresh(entry.cached_at, now) => {
                debug!("cache hit: {} ({})", request.url, self.cache_name);
                return Ok(entry.into_response());
            }
            Ok(Some(_)) => debug!("cache entry expired: {}", request.url),
            Ok(None) => debug!("cache miss: {}", request.url),
            // A broken lookup is a miss, not a failed load
            Err(e) => warn!("cache lookup failed for {}: {}", request.url, e),
        }

        let response = fetcher.fetch(request).await?;

        if self.cacheable_statuses.contains(&response.status) {
            // Write-back failure must not fail a response we already have
            if let Err(e) = storage.put(&self.cache_name, &request.url, &response) {
                warn!("failed to cache {}: {}", request.url, e);
            }
        } else {
            debug!(
                "status {} not cacheable, passing through: {}",
                response.status, request.url
            );
        }

        Ok(response)
    }
}
