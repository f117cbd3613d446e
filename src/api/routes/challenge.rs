//! Challenge Routes
//!
//! - GET /api/v1/challenge - Dashboard for today
//! - POST /api/v1/challenge - Start a new challenge today
//! - POST /api/v1/challenge/reset - Fail the current challenge and start over

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::routes::today;
use crate::api::state::AppState;
use crate::challenge::Dashboard;
use crate::storage::Challenge;

/// GET /api/v1/challenge
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Dashboard>> {
    let dashboard = state.tracker.dashboard(&auth.user.id, today()).await?;
    Ok(Json(dashboard))
}

/// POST /api/v1/challenge
pub async fn start_challenge(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<(StatusCode, Json<Challenge>)> {
    let challenge = state
        .tracker
        .start_new_challenge(&auth.user.id, today())
        .await?;
    Ok((StatusCode::CREATED, Json(challenge)))
}

/// POST /api/v1/challenge/reset
pub async fn reset_challenge(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<Challenge>> {
    let challenge = state.tracker.reset_challenge(&auth.user.id, today()).await?;
    Ok(Json(challenge))
}
