use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fetch::Fetcher;
use crate::request::{Destination, Request, RequestMode, Response};
use crate::storage::CacheStorage;
use crate::strategy::CacheFirst;
use crate::Result;

/// Partition reserved for build-pipeline precache entries; these never expire
/// and are served ahead of every route
pub const PRECACHE_NAME: &str = "precache";

/// One entry of the build manifest: a URL plus the revision the bundler
/// computed for it. The manifest is produced by the asset pipeline; this
/// layer only consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecacheEntry {
    pub url: String,
    pub revision: Option<String>,
}

/// Parse the JSON manifest the bundler emits
pub fn parse_manifest(json: &str) -> Result<Vec<PrecacheEntry>> {
    Ok(serde_json::from_str(json)?)
}

type Predicate = Box<dyn Fn(&Request) -> bool + Send + Sync>;

struct Route {
    predicate: Predicate,
    strategy: CacheFirst,
}

/// Ordered request router
///
/// Dispatch order is fixed: precached URLs first (unconditional), then the
/// registered (predicate, strategy) pairs in registration order, then a
/// plain pass-through fetch that caches nothing.
pub struct Router {
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    routes: Vec<Route>,
    precached: HashSet<String>,
}

impl Router {
    pub fn new(storage: Arc<CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            storage,
            fetcher,
            routes: Vec::new(),
            precached: HashSet::new(),
        }
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Register a route. First structurally-matching route wins, in
    /// registration order.
    pub fn register_route<P>(&mut self, predicate: P, strategy: CacheFirst)
    where
        P: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.routes.push(Route {
            predicate: Box::new(predicate),
            strategy,
        });
    }

    /// Install the build manifest: fetch each entry into the precache
    /// partition and route it unconditionally from then on.
    ///
    /// An entry whose stored revision already matches is skipped without a
    /// fetch; a null revision means the URL is content-hashed and the stored
    /// copy never goes stale. When the fetch fails (or comes back with an
    /// uncacheable status), a previously installed copy keeps being served -
    /// an offline re-install must not lose entries that are already on disk.
    pub async fn precache(&mut self, manifest: &[PrecacheEntry]) {
        for entry in manifest {
            let stored = match self.storage.get(PRECACHE_NAME, &entry.url) {
                Ok(stored) => stored,
                Err(e) => {
                    warn!("precache lookup failed for {}: {}", entry.url, e);
                    None
                }
            };

            if let Some(stored) = &stored {
                if stored.revision == entry.revision {
                    debug!("precache up to date: {}", entry.url);
                    self.precached.insert(entry.url.clone());
                    continue;
                }
            }

            let request = Request::new(entry.url.as_str(), RequestMode::NoCors, Destination::Other);
            match self.fetcher.fetch(&request).await {
                Ok(response) if response.status == 0 || response.status == 200 => {
                    let put = self.storage.put_at(
                        PRECACHE_NAME,
                        &entry.url,
                        &response,
                        Utc::now().timestamp(),
                        entry.revision.as_deref(),
                    );
                    match put {
                        Ok(()) => {
                            self.precached.insert(entry.url.clone());
                        }
                        Err(e) => warn!("failed to precache {}: {}", entry.url, e),
                    }
                }
                Ok(response) => {
                    warn!("not precaching {} (status {})", entry.url, response.status);
                    self.keep_stored(entry, stored.is_some());
                }
                Err(e) => {
                    warn!("precache fetch failed for {}: {}", entry.url, e);
                    self.keep_stored(entry, stored.is_some());
                }
            }
        }
        info!("precached {} of {} entries", self.precached.len(), manifest.len());
    }

    /// A refetch that didn't pan out still leaves the old copy routable
    fn keep_stored(&mut self, entry: &PrecacheEntry, has_stored: bool) {
        if has_stored {
            debug!("serving previously precached copy of {}", entry.url);
            self.precached.insert(entry.url.clone());
        }
    }

    /// Warm a strategy's cache by pushing navigation requests through it at
    /// install time, so the first real offline navigation is already a hit.
    pub async fn warm(&self, strategy: &CacheFirst, urls: &[&str]) {
        for url in urls {
            let request = Request::navigation(*url);
            match strategy
                .handle(&self.storage, self.fetcher.as_ref(), &request)
                .await
            {
                Ok(_) => debug!("warmed {} into {}", url, strategy.cache_name()),
                Err(e) => warn!("cache warm failed for {}: {}", url, e),
            }
        }
    }

    /// Route one request.
    pub async fn handle(&self, request: &Request) -> Result<Response> {
        if self.precached.contains(&request.url) {
            if let Some(entry) = self.storage.get(PRECACHE_NAME, &request.url)? {
                debug!("serving precached {}", request.url);
                return Ok(entry.into_response());
            }
        }

        for route in &self.routes {
            if (route.predicate)(request) {
                return route
                    .strategy
                    .handle(&self.storage, self.fetcher.as_ref(), request)
                    .await;
            }
        }

        // No route matched: straight to the network, nothing cached
        debug!("no route matched {}, passing through", request.url);
        self.fetcher.fetch(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Destination;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every URL that reaches the network
    struct RecordingFetcher {
        calls: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl RecordingFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for RecordingFetcher {
        async fn fetch(&self, request: &Request) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(request.url.clone());
            Ok(Response::ok(format!("body of {}", request.url).into_bytes()))
        }
    }

    fn test_router() -> (Router, Arc<RecordingFetcher>) {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let fetcher = Arc::new(RecordingFetcher::new());
        let router = Router::new(storage, fetcher.clone());
        (router, fetcher)
    }

    #[tokio::test]
    async fn test_first_matching_route_wins() {
        let (mut router, _) = test_router();
        router.register_route(
            |r: &Request| r.is_navigation(),
            CacheFirst::new("page-cache", 60),
        );
        router.register_route(
            |r: &Request| r.destination == Destination::Script,
            CacheFirst::new("asset-cache", 60),
        );

        // A navigating script-y request should land in the first route
        let request = Request::new("/odd", RequestMode::Navigate, Destination::Script);
        router.handle(&request).await.unwrap();

        assert_eq!(router.storage().partition_len("page-cache").unwrap(), 1);
        assert_eq!(router.storage().partition_len("asset-cache").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unmatched_request_passes_through_uncached() {
        let (mut router, fetcher) = test_router();
        router.register_route(
            |r: &Request| r.is_navigation(),
            CacheFirst::new("page-cache", 60),
        );

        let request = Request::asset("/data.json", Destination::Other);
        router.handle(&request).await.unwrap();
        router.handle(&request).await.unwrap();

        // Both went to the network, nothing was stored anywhere
        assert_eq!(fetcher.calls(), 2);
        assert_eq!(router.storage().partition_len("page-cache").unwrap(), 0);
        assert_eq!(router.storage().partition_len(PRECACHE_NAME).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_precache_serves_before_routes() {
        let (mut router, fetcher) = test_router();
        router.register_route(|_: &Request| true, CacheFirst::new("page-cache", 60));

        let manifest = vec![PrecacheEntry {
            url: "/app.bundle.js".to_string(),
            revision: Some("abc123".to_string()),
        }];
        router.precache(&manifest).await;
        assert_eq!(fetcher.calls(), 1);

        let request = Request::asset("/app.bundle.js", Destination::Script);
        let response = router.handle(&request).await.unwrap();
        assert_eq!(response.body, b"body of /app.bundle.js");

        // Served from the precache partition, not the catch-all route
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(router.storage().partition_len("page-cache").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_precache_skips_unchanged_revision() {
        let (mut router, fetcher) = test_router();
        let manifest = vec![PrecacheEntry {
            url: "/style.css".to_string(),
            revision: Some("v1".to_string()),
        }];

        router.precache(&manifest).await;
        router.precache(&manifest).await;
        assert_eq!(fetcher.calls(), 1);

        // A new revision refetches
        let bumped = vec![PrecacheEntry {
            url: "/style.css".to_string(),
            revision: Some("v2".to_string()),
        }];
        router.precache(&bumped).await;
        assert_eq!(fetcher.calls(), 2);
    }

    /// A network that refuses every request
    struct DeadNetwork;

    #[async_trait]
    impl Fetcher for DeadNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response> {
            Err(crate::CacheError::Fetch(format!(
                "offline: {}",
                request.url
            )))
        }
    }

    #[tokio::test]
    async fn test_offline_reinstall_keeps_null_revision_entry() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let manifest = vec![PrecacheEntry {
            url: "/main.abc123.js".to_string(),
            revision: None,
        }];

        // First session, online: the content-hashed bundle gets stored
        let mut online = Router::new(storage.clone(), Arc::new(RecordingFetcher::new()));
        online.precache(&manifest).await;

        // Next session installs while offline; the stored copy must still
        // be routed, not dropped on the floor
        let mut offline = Router::new(storage, Arc::new(DeadNetwork));
        offline.precache(&manifest).await;

        let response = offline
            .handle(&Request::asset("/main.abc123.js", Destination::Script))
            .await
            .unwrap();
        assert_eq!(response.body, b"body of /main.abc123.js");
    }

    #[tokio::test]
    async fn test_null_revision_entry_is_fetched_once() {
        let (mut router, fetcher) = test_router();
        let manifest = vec![PrecacheEntry {
            url: "/main.abc123.js".to_string(),
            revision: None,
        }];

        // Content-hashed URL: the stored copy never goes stale
        router.precache(&manifest).await;
        router.precache(&manifest).await;
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_revision_bump_serves_previous_copy() {
        let storage = Arc::new(CacheStorage::open_in_memory().unwrap());
        let mut online = Router::new(storage.clone(), Arc::new(RecordingFetcher::new()));
        online
            .precache(&[PrecacheEntry {
                url: "/style.css".to_string(),
                revision: Some("v1".to_string()),
            }])
            .await;

        // The v2 refetch fails; the v1 copy stays routable
        let mut offline = Router::new(storage, Arc::new(DeadNetwork));
        offline
            .precache(&[PrecacheEntry {
                url: "/style.css".to_string(),
                revision: Some("v2".to_string()),
            }])
            .await;

        let response = offline
            .handle(&Request::asset("/style.css", Destination::Style))
            .await
            .unwrap();
        assert_eq!(response.body, b"body of /style.css");
    }

    #[test]
    fn test_parse_manifest() {
        let manifest = parse_manifest(
            r#"[{"url": "/index.html", "revision": "d41d8cd9"}, {"url": "/main.abc123.js", "revision": null}]"#,
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest[0].url, "/index.html");
        assert_eq!(manifest[0].revision.as_deref(), Some("d41d8cd9"));
        assert!(manifest[1].revision.is_none());

        assert!(parse_manifest("not json").is_err());
    }

    #[tokio::test]
    async fn test_warm_makes_first_navigation_a_hit() {
        let (mut router, fetcher) = test_router();
        let page = CacheFirst::new("page-cache", 30 * 24 * 60 * 60);
        router.register_route(|r: &Request| r.is_navigation(), page.clone());

        router.warm(&page, &["/index.html", "/"]).await;
        assert_eq!(fetcher.calls(), 2);

        let response = router.handle(&Request::navigation("/")).await.unwrap();
        assert_eq!(response.body, b"body of /");
        // Still two: the navigation was served from the warmed cache
        assert_eq!(fetcher.calls(), 2);
    }
}
