//! Stub source extractor speaking a trivial JSON wire.
//!
//! Search pages and detail pages are JSON arrays of `SearchHit`, so tests
//! stub a `MockFetcher` with `stub_json(StubSource::page_url(..), &hits)`.
//! Two sentinel bodies drive the failure paths: `BLOCKED` trips the
//! block-page predicate and `FATAL` produces a fatal extraction error.

use crate::fetcher::FetchRequest;
use crate::search::{ExtractError, SearchHit, SourceExtractor};

pub const BLOCKED_BODY: &[u8] = b"BLOCKED";
pub const FATAL_BODY: &[u8] = b"FATAL";

/// Scripted `SourceExtractor` for tests.
pub struct StubSource {
    name: String,
    panic_on_parse: bool,
}

impl StubSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panic_on_parse: false,
        }
    }

    /// A stub whose search-page parser panics, for isolation tests.
    pub fn panicking(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            panic_on_parse: true,
        }
    }

    /// The URL `search_request` produces for `page`.
    pub fn page_url(name: &str, page: u32) -> String {
        format!("mock://{}/search/{}", name, page)
    }

    /// A detail-page URL usable as a `crawl_handle`.
    pub fn detail_url(name: &str, item: &str) -> String {
        format!("mock://{}/detail/{}", name, item)
    }
}

impl SourceExtractor for StubSource {
    fn search_request(&self, _encoded_keywords: &str, page: u32) -> FetchRequest {
        FetchRequest::get(Self::page_url(&self.name, page))
    }

    fn parse_search_page(&self, body: &[u8]) -> Result<Vec<SearchHit>, ExtractError> {
        if self.panic_on_parse {
            panic!("stub extractor panic: {}", self.name);
        }
        if body == FATAL_BODY {
            return Err(ExtractError::Fatal("stub fatal".to_string()));
        }
        serde_json::from_slice(body).map_err(|e| ExtractError::Malformed(e.to_string()))
    }

    fn parse_detail_page(
        &self,
        body: &[u8],
        _parent: &SearchHit,
    ) -> Result<Vec<SearchHit>, ExtractError> {
        serde_json::from_slice(body).map_err(|e| ExtractError::Malformed(e.to_string()))
    }

    fn is_block_page(&self, body: &[u8]) -> bool {
        body == BLOCKED_BODY
    }
}
