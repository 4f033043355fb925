//! Federated search orchestration.
//!
//! This module provides the session/token model, the per-source search
//! unit (`SearchPerformer`) with its two-phase search-then-crawl state
//! machine, and the concurrent scheduler (`SearchManager`) that runs many
//! units in parallel with per-unit failure isolation and cooperative
//! cancellation. Result aggregation lives in the sibling `filter` module.

mod manager;
mod performer;
mod source;
mod types;

pub use manager::SearchManager;
pub use performer::SearchPerformer;
pub use source::{encode_keywords, magnet_info_hash, SourceExtractor, SourceSpec};
pub use types::{
    ExtractError, SearchHit, SearchPhase, SearchToken, SessionListener, SourceError,
    SourceErrorKind,
};
