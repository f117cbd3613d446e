//! Catalogue Routes
//!
//! Static challenge content, no sign-in required.
//!
//! - GET /api/v1/habits - The five daily habits
//! - GET /api/v1/rules - The challenge rules (markdown)

use axum::Json;

use crate::api::dto::{HabitsResponse, RulesResponse};
use crate::habits::{CHALLENGE_DURATION, CHALLENGE_RULES, DAILY_HABITS};

/// GET /api/v1/habits
pub async fn list_habits() -> Json<HabitsResponse> {
    Json(HabitsResponse {
        habits: DAILY_HABITS.to_vec(),
        duration: CHALLENGE_DURATION,
    })
}

/// GET /api/v1/rules
pub async fn rules() -> Json<RulesResponse> {
    Json(RulesResponse {
        rules: CHALLENGE_RULES.to_string(),
    })
}
