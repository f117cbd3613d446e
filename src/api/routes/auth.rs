//! Auth Routes
//!
//! - POST /api/v1/auth/signup - Create an account
//! - POST /api/v1/auth/login - Sign in, returns a bearer token
//! - POST /api/v1/auth/logout - End the current session
//! - GET /api/v1/auth/session - Current user
//! - POST /api/v1/auth/reset-password - Request a password reset

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{
    LoginRequest, MessageResponse, ResetPasswordRequest, SignUpRequest, UserResponse,
};
use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::state::AppState;
use crate::auth::SignedIn;

/// POST /api/v1/auth/signup
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .auth
        .sign_up(&req.email, &req.password, req.full_name)
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse { user })))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SignedIn>> {
    let signed_in = state.auth.sign_in(&req.email, &req.password).await?;
    Ok(Json(signed_in))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.sign_out(&auth.token).await?;
    tracing::info!(user_id = %auth.user.id, "User signed out");
    Ok(Json(MessageResponse::ok("Signed out")))
}

/// GET /api/v1/auth/session
pub async fn session(auth: AuthUser) -> Json<UserResponse> {
    Json(UserResponse { user: auth.user })
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.request_password_reset(&req.email).await?;
    Ok(Json(MessageResponse::ok(
        "Password reset instructions have been sent",
    )))
}
