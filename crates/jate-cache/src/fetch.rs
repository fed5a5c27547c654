use async_trait::async_trait;

use crate::request::{Request, Response};
use crate::Result;

/// Trait for the network side of the cache - makes testing easier and keeps
/// things flexible
///
/// The strategies only ever talk to the network through this, so tests can
/// swap in a stub that counts calls or refuses to answer.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// The real thing: fetch over HTTP with reqwest
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let resp = self.client.get(&request.url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(Response::new(status, body))
    }
}
