use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::{handlers, search, sources};
use crate::metrics;
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(handlers::health))
        // Search sessions
        .route("/search", post(search::start_search))
        .route("/search/{token}", get(search::get_results))
        .route("/search/{token}", delete(search::stop_search))
        // Sources
        .route("/sources", get(sources::list_sources))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = metrics::normalize_path(request.uri().path());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    metrics::HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), &path, &status])
        .inc();
    metrics::HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str(), &path, &status])
        .observe(started.elapsed().as_secs_f64());

    response
}
