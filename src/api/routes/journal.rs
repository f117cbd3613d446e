//! Journal Routes
//!
//! - GET /api/v1/journal - All entries, newest first, plus today's
//! - PUT /api/v1/journal/today - Save today's entry
//! - GET /api/v1/journal/export?format=text|csv|json - Download entries

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ExportParams, JournalListResponse, JournalRequest};
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::AuthUser;
use crate::api::routes::today;
use crate::api::state::AppState;
use crate::journal::ExportFormat;
use crate::storage::JournalEntry;

/// GET /api/v1/journal
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> ApiResult<Json<JournalListResponse>> {
    let entries = state.journal.list_entries(&auth.user.id).await?;
    let todays = state.journal.today_entry(&auth.user.id, today()).await?;
    Ok(Json(JournalListResponse {
        entries,
        today: todays,
    }))
}

/// PUT /api/v1/journal/today
pub async fn save_today(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<JournalRequest>,
) -> ApiResult<Json<JournalEntry>> {
    let entry = state
        .journal
        .save_entry(&auth.user.id, today(), &req.content)
        .await?;
    Ok(Json(entry))
}

/// GET /api/v1/journal/export
pub async fn export_entries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    if !state.config.enable_export {
        return Err(ApiError::Validation(
            "Export feature is disabled".to_string(),
        ));
    }

    let format: ExportFormat = params.format.parse()?;
    let doc = state.journal.export(&auth.user, format).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.filename),
            ),
        ],
        Body::from(doc.body),
    )
        .into_response())
}
