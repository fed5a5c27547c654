/// What a request is asking for, mirroring the browser's request metadata
///
/// Routing predicates look at these two attributes and nothing else, so
/// classification stays deterministic and easy to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Style,
    Script,
    Worker,
    Image,
    Font,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    /// Subresource load
    NoCors,
}

/// An incoming resource request
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
}

impl Request {
    pub fn new(url: impl Into<String>, mode: RequestMode, destination: Destination) -> Self {
        Self {
            url: url.into(),
            mode,
            destination,
        }
    }

    /// A page navigation request
    pub fn navigation(url: impl Into<String>) -> Self {
        Self::new(url, RequestMode::Navigate, Destination::Document)
    }

    /// A subresource request of the given kind
    pub fn asset(url: impl Into<String>, destination: Destination) -> Self {
        Self::new(url, RequestMode::NoCors, destination)
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// A fetched (or cached) response
///
/// Status 0 models an opaque cross-origin response; together with 200 it is
/// the only status the strategies will ever write to cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Vec<u8>) -> Self {
        Self::new(200, body)
    }

    /// Opaque cross-origin response: status 0, body hidden from us
    pub fn opaque() -> Self {
        Self::new(0, Vec::new())
    }
}
