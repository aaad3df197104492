//! REST endpoints for reviewers: accept or reject a triage card.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};

use super::Card;
use crate::error::ApiError;
use crate::server::AppState;

/// Build the `/cards` review routes.
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/cards/{id}/accept", post(accept_card))
        .route("/cards/{id}/reject", post(reject_card))
}

/// POST /cards/{id}/accept
async fn accept_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let mut card = state.board.find_card(&id).await?;
    Ok(Json(state.board.accept(&mut card).await?))
}

/// POST /cards/{id}/reject
async fn reject_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Card>, ApiError> {
    let mut card = state.board.find_card(&id).await?;
    Ok(Json(state.board.reject(&mut card).await?))
}
