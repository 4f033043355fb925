//! Page fetching abstraction.
//!
//! The fetch call is the only suspension point in a search unit; everything
//! else is CPU-bound parsing. Implementations own transport mechanics
//! (timeouts, redirects, user agents) behind the `fetch(request) -> bytes`
//! contract.

mod http;

pub use http::HttpFetcher;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// HTTP method for a page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMethod {
    Get,
    PostJson { body: String },
}

/// A single page fetch, as built by a source extractor.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: FetchMethod,
    pub headers: HashMap<String, String>,
}

impl FetchRequest {
    /// Plain GET with no custom headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::Get,
            headers: HashMap::new(),
        }
    }

    /// POST with a JSON body.
    pub fn post_json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: FetchMethod::PostJson { body: body.into() },
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {code}: {url}")]
    Status { code: u16, url: String },

    #[error("fetch failed: {0}")]
    Other(String),
}

/// Trait for page fetch backends.
///
/// Synchronous from the calling worker's point of view: the worker suspends
/// on the fetch and resumes with bytes or a failure. An in-flight fetch is
/// never forcibly aborted by cooperative stop.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>, FetchError>;
}
