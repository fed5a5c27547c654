use std::sync::Arc;

use jate_cache::{CacheFirst, CacheStorage, Destination, Fetcher, PrecacheEntry, Request, Router};

use crate::config::PolicyConfig;

/// Build the strategy for one rule of the table
fn strategy(cache_name: &str, max_age_seconds: i64, policy: &PolicyConfig) -> CacheFirst {
    CacheFirst::new(cache_name, max_age_seconds)
        .with_cacheable_statuses(policy.cacheable_statuses.clone())
}

pub fn page_strategy(policy: &PolicyConfig) -> CacheFirst {
    strategy(&policy.page.cache_name, policy.page.max_age_seconds, policy)
}

pub fn asset_strategy(policy: &PolicyConfig) -> CacheFirst {
    strategy(&policy.asset.cache_name, policy.asset.max_age_seconds, policy)
}

pub fn logo_strategy(policy: &PolicyConfig) -> CacheFirst {
    strategy(&policy.logo.cache_name, policy.logo.max_age_seconds, policy)
}

/// Wire the configured rule table into a router
///
/// Registration order is the table order and is load-bearing: page
/// navigations, then style/script/worker assets, then the logo image. A
/// request that matches none of the three passes straight through uncached.
pub fn build_router(
    policy: &PolicyConfig,
    storage: Arc<CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
) -> Router {
    let mut router = Router::new(storage, fetcher);

    router.register_route(|r: &Request| r.is_navigation(), page_strategy(policy));

    router.register_route(
        |r: &Request| {
            matches!(
                r.destination,
                Destination::Style | Destination::Script | Destination::Worker
            )
        },
        asset_strategy(policy),
    );

    let suffix = policy.logo.path_suffix.clone();
    router.register_route(
        move |r: &Request| r.destination == Destination::Image && r.url.ends_with(&suffix),
        logo_strategy(policy),
    );

    router
}

/// Install-time work: precache the build manifest, then warm the page cache
/// so the very first offline navigation is already a hit.
pub async fn install(router: &mut Router, policy: &PolicyConfig, manifest: &[PrecacheEntry]) {
    router.precache(manifest).await;

    let page = page_strategy(policy);
    let urls: Vec<&str> = policy.warm_urls.iter().map(String::as_str).collect();
    router.warm(&page, &urls).await;
}
