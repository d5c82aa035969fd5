//! Axum router configuration with middleware.
//!
//! Routes live under `/api/`, plus `/health` and the legacy `/chat` form
//! endpoint. Middleware: CORS, tracing. Unmatched paths get a JSON 404.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::error::AppError;
use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Chat turns
        .route("/chat", post(handlers::chat::send_chat))
        // Sessions
        .route("/chats", get(handlers::session::list_sessions))
        .route("/chat/history", post(handlers::session::get_history))
        .route("/chat/delete", post(handlers::session::delete_session))
        .route("/chats/clear", post(handlers::session::clear_sessions))
        // Voice
        .route("/voice/process", post(handlers::voice::process_voice));

    Router::new()
        .nest("/api", api_routes)
        .route("/chat", post(handlers::chat::send_chat))
        .route("/health", get(health_check))
        .fallback(route_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "time": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn route_not_found() -> AppError {
    AppError::NotFound
}
