//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits
//! (`PageFetcher`, `SourceExtractor`, `SessionListener`), allowing full
//! session tests without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use dragnet_core::testing::{fixtures, MockFetcher, RecordingListener, StubSource};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! fetcher.stub_json(&StubSource::page_url("mock", 0), &vec![
//!     fixtures::hit("Alpha", "mock", 10),
//! ]);
//!
//! let listener = Arc::new(RecordingListener::new());
//! // Wire both into a SearchPerformer / SearchManager...
//! ```

mod mock_fetcher;
mod recording_listener;
mod stub_source;

pub use mock_fetcher::MockFetcher;
pub use recording_listener::RecordingListener;
pub use stub_source::{StubSource, BLOCKED_BODY, FATAL_BODY};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::search::SearchHit;

    /// A final (complete) hit with reasonable defaults.
    pub fn hit(title: &str, source: &str, seeders: u32) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            source: source.to_string(),
            details_url: Some(format!("https://{}.example/item/{}", source, title)),
            size_bytes: 1024 * 1024 * 100,
            seeders,
            leechers: seeders / 2,
            publish_date: None,
            download_url: None,
            info_hash: None,
            complete: true,
            crawl_handle: None,
        }
    }

    /// A preliminary hit pointing at `crawl_handle` for its detail page.
    pub fn preliminary(title: &str, source: &str, crawl_handle: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            source: source.to_string(),
            details_url: Some(crawl_handle.to_string()),
            size_bytes: 0,
            seeders: 0,
            leechers: 0,
            publish_date: None,
            download_url: None,
            info_hash: None,
            complete: false,
            crawl_handle: Some(crawl_handle.to_string()),
        }
    }
}
