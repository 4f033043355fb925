//! Search session API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use dragnet_core::{
    CompositeFilter, MinSeedersFilter, ResultSink, SearchFilter, SearchHit, SearchPerformer,
    SearchPhase, SearchToken, SinkListener, SourceGroupFilter,
};

use crate::metrics;
use crate::state::{AppState, SessionEntry};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn not_found(token: u64) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("no session with token {}", token),
        }),
    )
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartSearchRequest {
    pub keywords: String,
    /// Restrict the session to these source names. Default: every enabled source.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct StartSearchResponse {
    pub token: SearchToken,
    pub keywords: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    /// `source` (default) or `none` for a single flat group.
    #[serde(default)]
    pub group_by: Option<String>,
    #[serde(default)]
    pub min_seeders: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub token: SearchToken,
    pub keywords: String,
    pub started_at: DateTime<Utc>,
    pub finished: bool,
    pub total_results: usize,
    pub errors: Vec<SourceErrorItem>,
    pub groups: Vec<GroupItem>,
}

#[derive(Debug, Serialize)]
pub struct SourceErrorItem {
    pub source: String,
    pub phase: SearchPhase,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct GroupItem {
    /// Group key; absent for the unclassified bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct StopSearchResponse {
    pub token: SearchToken,
    pub stopped: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Start a session: one search unit per selected source, fanned out on the
/// shared manager. Returns immediately; results accumulate server-side.
pub async fn start_search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartSearchRequest>,
) -> Result<Json<StartSearchResponse>, ApiError> {
    let keywords = body.keywords.trim().to_string();
    if keywords.is_empty() {
        return Err(bad_request("keywords must not be empty"));
    }

    let selected: Vec<_> = match &body.sources {
        Some(names) => {
            let mut selected = Vec::new();
            for name in names {
                let source = state
                    .sources()
                    .iter()
                    .find(|s| &s.entry.spec.name == name)
                    .ok_or_else(|| bad_request(format!("unknown source: {}", name)))?;
                selected.push(source);
            }
            selected
        }
        None => state.sources().iter().collect(),
    };
    if selected.is_empty() {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "no sources configured".to_string(),
            }),
        ));
    }

    let token = SearchToken::next();
    let sink = ResultSink::new();
    let listener = Arc::new(SinkListener::new(token, sink));

    let source_names: Vec<String> = selected
        .iter()
        .map(|s| s.entry.spec.name.clone())
        .collect();
    state.sessions().insert(
        token,
        Arc::new(SessionEntry {
            keywords: keywords.clone(),
            sources: source_names.clone(),
            started_at: Utc::now(),
            listener,
        }),
    );
    metrics::SESSIONS_STARTED.inc();
    metrics::SESSIONS_REGISTERED.set(state.sessions().len() as i64);

    let crawl_concurrency = state.config().search.crawl_concurrency;
    for source in selected {
        let performer = SearchPerformer::new(
            token,
            keywords.clone(),
            source.entry.spec.clone(),
            Arc::clone(&source.extractor),
            state.fetcher(),
        )
        .with_crawl_concurrency(crawl_concurrency);
        state.manager().submit(Arc::new(performer));
    }

    info!(token = %token, keywords = %keywords, sources = ?source_names, "Session started");

    Ok(Json(StartSearchResponse {
        token,
        keywords,
        sources: source_names,
    }))
}

/// GET /api/v1/search/{token}
///
/// Snapshot of a session's results, filtered and grouped on the fly.
pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Path(token): Path<u64>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsResponse>, ApiError> {
    let session = state
        .sessions()
        .get(SearchToken(token))
        .ok_or_else(|| not_found(token))?;

    let mut parts: Vec<Box<dyn SearchFilter>> =
        vec![Box::new(MinSeedersFilter::new(query.min_seeders.unwrap_or(0)))];
    match query.group_by.as_deref() {
        None | Some("source") => parts.push(Box::new(SourceGroupFilter)),
        Some("none") => {}
        Some(other) => {
            return Err(bad_request(format!("unknown group_by: {}", other)));
        }
    }

    let sink = session.listener.sink();
    let view = sink.view(Box::new(CompositeFilter::and(parts)));

    let groups = view
        .groups()
        .into_iter()
        .map(|group| GroupItem {
            key: if group.key().is_null() {
                None
            } else {
                Some(group.key().display().to_string())
            },
            hits: group.hits().to_vec(),
        })
        .collect();

    let errors = session
        .listener
        .errors()
        .into_iter()
        .map(|e| SourceErrorItem {
            message: e.to_string(),
            source: e.source_name,
            phase: e.phase,
        })
        .collect();

    Ok(Json(ResultsResponse {
        token: SearchToken(token),
        keywords: session.keywords.clone(),
        started_at: session.started_at,
        finished: session.listener.is_finished(),
        total_results: sink.len(),
        errors,
        groups,
    }))
}

/// DELETE /api/v1/search/{token}
///
/// Cooperatively stop every unit of the session. Results collected so far
/// stay readable. Idempotent.
pub async fn stop_search(
    State(state): State<Arc<AppState>>,
    Path(token): Path<u64>,
) -> Result<Json<StopSearchResponse>, ApiError> {
    let token = SearchToken(token);
    if state.sessions().get(token).is_none() {
        return Err(not_found(token.value()));
    }

    state.manager().stop(token);
    info!(token = %token, "Session stop requested");

    Ok(Json(StopSearchResponse {
        token,
        stopped: true,
    }))
}
