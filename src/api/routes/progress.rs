//! Progress Routes
//!
//! - GET /api/v1/progress/today - Habit completion for today
//! - POST /api/v1/progress/:habit_id/toggle - Flip one habit for today

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::ProgressResponse;
use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::routes::today;
use crate::api::state::AppState;
use crate::challenge::{streak, ToggleOutcome};

/// GET /api/v1/progress/today
pub async fn today_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<ProgressResponse>> {
    let date = today();
    let progress = state.tracker.todays_progress(&auth.user.id, date).await?;

    Ok(Json(ProgressResponse {
        date,
        completion_rate: streak::completion_rate(&progress),
        progress,
    }))
}

/// POST /api/v1/progress/:habit_id/toggle
pub async fn toggle_habit(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(habit_id): Path<String>,
) -> ApiResult<Json<ToggleOutcome>> {
    let outcome = state
        .tracker
        .toggle_habit(&auth.user.id, &habit_id, today())
        .await?;
    Ok(Json(outcome))
}
