//! Profile Routes
//!
//! - GET /api/v1/profile - User with lifetime statistics
//! - PUT /api/v1/profile - Change the display name

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{ProfileResponse, UpdateProfileRequest};
use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::state::AppState;
use crate::storage::User;

/// GET /api/v1/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    profile_response(&state, auth.user).await.map(Json)
}

/// PUT /api/v1/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state.auth.update_profile(&auth.user.id, req.full_name).await?;
    tracing::info!(user_id = %user.id, "Profile updated");
    profile_response(&state, user).await.map(Json)
}

async fn profile_response(state: &AppState, user: User) -> ApiResult<ProfileResponse> {
    let stats = state.tracker.profile_stats(&user.id).await?;
    Ok(ProfileResponse {
        display_name: user.display_name().to_string(),
        user,
        stats,
    })
}
