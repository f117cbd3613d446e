//! Certificate Routes
//!
//! - GET /api/v1/certificate - Eligibility and days remaining
//! - GET /api/v1/certificate/download - HTML certificate (403 until earned)

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::routes::today;
use crate::api::state::AppState;
use crate::certificate::{self, CertificateStatus};

/// GET /api/v1/certificate
pub async fn status(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<CertificateStatus>> {
    let streak = state.tracker.current_streak(&auth.user.id, today()).await?;
    Ok(Json(CertificateStatus::for_streak(streak)))
}

/// GET /api/v1/certificate/download
pub async fn download(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Response> {
    let date = today();
    let streak = state.tracker.current_streak(&auth.user.id, date).await?;
    let doc = certificate::issue(&auth.user, streak, date)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.filename),
            ),
        ],
        Body::from(doc.html),
    )
        .into_response())
}
