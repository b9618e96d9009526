//! Router assembly: JSON API, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
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
/// - JSON API under `/api/...`
/// - Static SPA from the configured static dir with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let static_service = ServeDir::new(&static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/health", get(http::http_health))
        .route("/api/banks", get(http::http_list_banks))
        .route(
            "/api/sessions",
            get(http::http_list_sessions).post(http::http_create_session),
        )
        .route(
            "/api/sessions/:id",
            get(http::http_get_session).delete(http::http_delete_session),
        )
        .route("/api/sessions/:id/navigate", post(http::http_navigate))
        .route("/api/sessions/:id/answer", post(http::http_answer))
        .route("/api/sessions/:id/flag", post(http::http_flag))
        .route("/api/sessions/:id/note", post(http::http_note))
        .route("/api/sessions/:id/finish", post(http::http_finish))
        .route("/api/sessions/:id/terminate", post(http::http_terminate))
        .route("/api/sessions/:id/status", get(http::http_status))
        .route("/api/history", get(http::http_list_history))
        .route("/api/history/:id", delete(http::http_delete_history))
        .route("/api/history/:id/rename", post(http::http_rename_history))
        // State + CORS + HTTP tracing
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
        // Frontend fallback
        .fallback_service(static_service)
}
