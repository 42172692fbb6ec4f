//! Router assembly: JSON API, static files, CORS, and HTTP tracing.

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - Static frontend from `settings.static_dir` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = Path::new(&state.settings.static_dir);
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/users", get(http::http_list_users))
        .route("/api/v1/select", post(http::http_select_user))
        .route("/api/v1/tasks", get(http::http_get_tasks).post(http::http_post_tasks))
        .route("/api/v1/submit_page_numbers", post(http::http_post_page_numbers))
        .route("/api/v1/history", get(http::http_get_history))
        .route("/api/v1/parent", get(http::http_get_parent).post(http::http_post_parent))
        .route("/api/v1/ai_problems", get(http::http_get_ai_problems))
        .route("/api/v1/ai_problems/get_hint", post(http::http_post_hint))
        .route("/api/v1/ai_problems/refresh", post(http::http_post_refresh))
        .route("/api/v1/ai_problems/difficulty", post(http::http_post_difficulty))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .fallback_service(static_service)
}
