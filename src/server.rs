//! HTTP server — shared state and router assembly.

use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::board::TaskBoard;
use crate::board::routes::review_routes;
use crate::calls::call_routes;
use crate::labeler::ImageLabeler;
use crate::requests::request_routes;
use crate::store::Database;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub labeler: Arc<dyn ImageLabeler>,
    pub board: Arc<TaskBoard>,
}

/// Build the full router: requests, call webhooks, card review and health.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(request_routes())
        .merge(call_routes())
        .merge(review_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the app on an already-bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server started");
    axum::serve(listener, app(state)).await
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "photo-intake"
    }))
}
