//! JSON data endpoints backing the dashboard and profile pages.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use crate::auth;
use crate::error::AppError;
use crate::state::AppState;
use crate::types::Poll;

/// Response structure for the poll list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollListResponse {
    pub polls: Vec<Poll>,
    pub total_polls: usize,
}

/// Response structure for profile statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub username: String,
    pub vote_count: usize,
}

/// List all polls with their current vote counts.
///
/// GET /api/polls
pub async fn list_polls(State(state): State<Arc<AppState>>) -> Result<Json<PollListResponse>, AppError> {
    let polls = state.polls.list_polls().await?;
    let total_polls = polls.len();

    Ok(Json(PollListResponse { polls, total_polls }))
}

/// Profile statistics for the signed-in user.
///
/// GET /api/profile
pub async fn profile(
    session: Session,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let Some(identity) = auth::current_user(&session).await else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    let Some(user) = state.users.get_user(&identity.id).await? else {
        // Session outlived the account; treat as signed out
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    Ok(Json(ProfileResponse {
        username: user.username,
        vote_count: user.participated_polls.len(),
    })
    .into_response())
}
