//! The per-source collaborator seam.
//!
//! A `SourceExtractor` owns the URL templates and parsing rules for one
//! source. Extractors are pure with respect to orchestration: they get
//! bytes in and give hits out, with no I/O and no access to stop flags.
//! The only control-flow signal they expose is the post-hoc block-page
//! predicate the performer consults after every search-page fetch.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::fetcher::FetchRequest;

use super::types::{ExtractError, SearchHit};

/// Static description of one source, used by the performer to drive
/// pagination and crawling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Source name, used in hits, errors and logs.
    pub name: String,
    /// Maximum search result pages to fetch.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Maximum detail-page crawls per session.
    #[serde(default = "default_max_crawls")]
    pub max_crawls: u32,
    /// Whether preliminary hits from this source get a detail crawl.
    #[serde(default)]
    pub crawler: bool,
    /// Per-fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_max_pages() -> u32 {
    1
}

fn default_max_crawls() -> u32 {
    50
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl SourceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_pages: default_max_pages(),
            max_crawls: default_max_crawls(),
            crawler: false,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_max_crawls(mut self, max_crawls: u32) -> Self {
        self.max_crawls = max_crawls;
        self
    }

    pub fn crawling(mut self) -> Self {
        self.crawler = true;
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Parsing rules for one source.
///
/// `parse_detail_page` is only called for sources whose spec has the
/// crawler flag set; one preliminary hit may expand into many final hits
/// (e.g. multiple files inside one torrent).
pub trait SourceExtractor: Send + Sync {
    /// Build the fetch request for search result page `page` (0-based).
    fn search_request(&self, encoded_keywords: &str, page: u32) -> FetchRequest;

    /// Extract hits from a search result page.
    fn parse_search_page(&self, body: &[u8]) -> Result<Vec<SearchHit>, ExtractError>;

    /// Expand a preliminary hit's detail page into final hits.
    fn parse_detail_page(
        &self,
        body: &[u8],
        parent: &SearchHit,
    ) -> Result<Vec<SearchHit>, ExtractError> {
        let _ = body;
        Err(ExtractError::Malformed(format!(
            "source has no detail-page extractor (parent: {})",
            parent.title
        )))
    }

    /// Whether the page content is a DDOS challenge or captcha wall.
    fn is_block_page(&self, body: &[u8]) -> bool {
        let _ = body;
        false
    }
}

/// URL-encode raw keywords for use in `search_request` builders.
pub fn encode_keywords(keywords: &str) -> String {
    urlencoding::encode(keywords.trim()).into_owned()
}

static MAGNET_HASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"magnet:\?xt=urn:btih:([a-fA-F0-9]{40})").unwrap());

/// Pull the info hash out of a magnet URI, lowercased.
pub fn magnet_info_hash(magnet: &str) -> Option<String> {
    MAGNET_HASH
        .captures(magnet)
        .map(|c| c[1].to_lowercase())
}
