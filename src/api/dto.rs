//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::challenge::{ProfileStats, ProgressMap};
use crate::habits::Habit;
use crate::storage::{JournalEntry, User};

// ============================================
// AUTH DTOs
// ============================================

/// Sign-up request
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Sign-in request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password reset request
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Current user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: String,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
        }
    }
}

// ============================================
// PROFILE DTOs
// ============================================

/// Profile update request
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Profile with lifetime statistics
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub display_name: String,
    pub stats: ProfileStats,
}

// ============================================
// CATALOGUE DTOs
// ============================================

/// Habit catalogue
#[derive(Debug, Serialize)]
pub struct HabitsResponse {
    pub habits: Vec<Habit>,
    pub duration: u32,
}

/// Challenge rules
#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub rules: String,
}

// ============================================
// PROGRESS DTOs
// ============================================

/// Completion state for one day
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub date: NaiveDate,
    pub progress: ProgressMap,
    pub completion_rate: f64,
}

// ============================================
// JOURNAL DTOs
// ============================================

/// Journal save request
#[derive(Debug, Deserialize)]
pub struct JournalRequest {
    pub content: String,
}

/// Journal listing
#[derive(Debug, Serialize)]
pub struct JournalListResponse {
    pub entries: Vec<JournalEntry>,
    pub today: Option<JournalEntry>,
}

/// Export query parameters
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// Output format: text, csv, json
    #[serde(default = "default_export_format")]
    pub format: String,
}

fn default_export_format() -> String {
    "text".to_string()
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: "healthy" or "unhealthy"
    pub status: String,
    /// Store status
    pub storage: String,
    /// Store backend name
    pub backend: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Server version
    pub version: String,
}
