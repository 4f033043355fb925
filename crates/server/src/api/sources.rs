//! Source listing handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use dragnet_core::SourceKind;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub sources: Vec<SourceItem>,
}

#[derive(Debug, Serialize)]
pub struct SourceItem {
    pub name: String,
    pub kind: SourceKind,
    pub enabled: bool,
    pub crawler: bool,
    pub max_pages: u32,
    pub max_crawls: u32,
}

/// GET /api/v1/sources
///
/// Every configured source, enabled or not.
pub async fn list_sources(State(state): State<Arc<AppState>>) -> Json<SourcesResponse> {
    let sources = state
        .config()
        .sources
        .iter()
        .map(|entry| SourceItem {
            name: entry.spec.name.clone(),
            kind: entry.kind,
            enabled: entry.enabled,
            crawler: entry.spec.crawler,
            max_pages: entry.spec.max_pages,
            max_crawls: entry.spec.max_crawls,
        })
        .collect();

    Json(SourcesResponse { sources })
}
