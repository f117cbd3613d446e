//! Achievement Routes
//!
//! - GET /api/v1/achievements - Milestones unlocked by the current streak

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::routes::today;
use crate::api::state::AppState;
use crate::challenge::AchievementSummary;

/// GET /api/v1/achievements
pub async fn achievements(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<AchievementSummary>> {
    let streak = state.tracker.current_streak(&auth.user.id, today()).await?;
    Ok(Json(AchievementSummary::for_streak(streak)))
}
