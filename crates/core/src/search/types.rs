//! Types for federated search sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

use crate::fetcher::FetchError;

/// Opaque identifier binding a set of concurrently running search units
/// to one logical user-initiated search.
///
/// Tokens carry no ordering semantics; they are used only for identity,
/// routing results to the right session, and discarding late arrivals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchToken(pub u64);

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

impl SearchToken {
    /// Issue a fresh token from a process-wide counter.
    pub fn next() -> Self {
        SearchToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SearchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single result reported by a source.
///
/// Hits with `complete == false` are preliminary: they identify the item and
/// carry a `crawl_handle` locating the detail page, but are missing fields
/// that require a second fetch. The performer promotes them to final hits
/// (or discards them); a preliminary hit is never delivered to the session
/// listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Display title.
    pub title: String,
    /// Name of the source that reported this hit.
    pub source: String,
    /// Link to the item's page on the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_url: Option<String>,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Seeders reported by the source.
    pub seeders: u32,
    /// Leechers reported by the source.
    pub leechers: u32,
    /// When the item was published, if the source reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    /// Direct download or stream URL (magnet, .torrent, media).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Info hash (lowercase hex) when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Whether the hit is safe to present as-is.
    pub complete: bool,
    /// Detail-page locator for preliminary hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crawl_handle: Option<String>,
}

impl SearchHit {
    pub fn is_preliminary(&self) -> bool {
        !self.complete
    }
}

/// Which phase of a search unit an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    /// Fetching or parsing search result page N.
    SearchPage(u32),
    /// Fetching or parsing a detail page.
    Crawl,
    /// Programming or configuration error inside the unit.
    Contract,
}

impl fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchPhase::SearchPage(n) => write!(f, "search page {}", n),
            SearchPhase::Crawl => write!(f, "crawl"),
            SearchPhase::Contract => write!(f, "contract"),
        }
    }
}

/// Errors an extractor can report while parsing a page.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The page parsed but contained no recognizable results.
    #[error("no matches in page")]
    NoMatches,

    /// The page shape did not match what the extractor expects.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The extractor declared the failure fatal; remaining pages are skipped.
    #[error("fatal extraction failure: {0}")]
    Fatal(String),
}

impl ExtractError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExtractError::Fatal(_))
    }
}

/// An error from one source, reported via the session listener.
///
/// Source errors never abort the session; they mean the session simply
/// yields fewer results from that source.
#[derive(Debug, Clone, Error)]
#[error("source {source_name} failed during {phase}: {kind}")]
pub struct SourceError {
    /// Which source failed. Not named `source`: thiserror reserves that
    /// field name for the error cause, and this is a plain string.
    pub source_name: String,
    /// Which phase of the unit failed.
    pub phase: SearchPhase,
    /// The underlying failure.
    pub kind: SourceErrorKind,
}

#[derive(Debug, Clone, Error)]
pub enum SourceErrorKind {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("block page detected")]
    BlockPage,

    #[error("contract violation: {0}")]
    Contract(String),
}

impl SourceError {
    pub fn fetch(source: &str, phase: SearchPhase, error: FetchError) -> Self {
        Self {
            source_name: source.to_string(),
            phase,
            kind: SourceErrorKind::Fetch(error),
        }
    }

    pub fn extract(source: &str, phase: SearchPhase, error: ExtractError) -> Self {
        Self {
            source_name: source.to_string(),
            phase,
            kind: SourceErrorKind::Extract(error),
        }
    }

    pub fn block_page(source: &str, page: u32) -> Self {
        Self {
            source_name: source.to_string(),
            phase: SearchPhase::SearchPage(page),
            kind: SourceErrorKind::BlockPage,
        }
    }

    pub fn contract(source: &str, message: impl Into<String>) -> Self {
        Self {
            source_name: source.to_string(),
            phase: SearchPhase::Contract,
            kind: SourceErrorKind::Contract(message.into()),
        }
    }
}

/// Session-scoped callback surface exposed to callers.
///
/// All three callbacks may be invoked concurrently from different search
/// unit workers under the same token; implementations must be thread-safe.
pub trait SessionListener: Send + Sync {
    /// A batch of final hits arrived from one unit.
    fn on_results(&self, token: SearchToken, results: Vec<SearchHit>);

    /// One source failed a page fetch, a crawl, or its contract.
    fn on_error(&self, token: SearchToken, error: SourceError);

    /// The last unit registered under `token` finished or was stopped.
    fn on_stopped(&self, token: SearchToken);
}
