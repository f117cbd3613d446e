//! Core record types persisted by the habit stores
//!
//! - `User` / `UserRecord`: accounts (the record carries the password hash)
//! - `Session`: bearer-token sessions
//! - `Challenge` and `ChallengeStatus`: a 40-day attempt
//! - `DailyProgress`: one habit checked off on one day
//! - `JournalEntry`: one reflection per user per day

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Generate a new record id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Public view of an account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Name shown on documents, falling back to a generic title
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Challenge Participant")
    }
}

/// Stored account, including the password hash
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub password_hash: String,
}

/// Authenticated session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Lifecycle state of a challenge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// In progress
    Active,
    /// Reached the final day
    Completed,
    /// Abandoned by a reset
    Failed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ChallengeStatus::Active),
            "completed" => Ok(ChallengeStatus::Completed),
            "failed" => Ok(ChallengeStatus::Failed),
            other => Err(format!("unknown challenge status: {}", other)),
        }
    }
}

/// A user's 40-day attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Challenge {
    pub id: String,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub current_day: u32,
    pub status: ChallengeStatus,
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// A fresh challenge starting on `start_date` at day 1
    pub fn new(user_id: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.into(),
            start_date,
            current_day: 1,
            status: ChallengeStatus::Active,
            last_completed_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ChallengeStatus::Active
    }
}

/// Fields rewritten when a day is fully completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeUpdate {
    pub current_day: u32,
    pub last_completed_date: NaiveDate,
    pub status: ChallengeStatus,
}

impl Challenge {
    /// Apply an update in place
    pub fn apply(&mut self, update: &ChallengeUpdate) {
        self.current_day = update.current_day;
        self.last_completed_date = Some(update.last_completed_date);
        self.status = update.status;
    }
}

/// One habit checked off on one day; unique per (user, date, habit)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyProgress {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub habit_id: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A daily reflection; unique per (user, date)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: Option<&str>) -> User {
        User {
            id: new_id(),
            email: "a@example.com".to_string(),
            full_name: full_name.map(String::from),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_fallback() {
        assert_eq!(user(Some("Amina Yusuf")).display_name(), "Amina Yusuf");
        assert_eq!(user(Some("   ")).display_name(), "Challenge Participant");
        assert_eq!(user(None).display_name(), "Challenge Participant");
    }

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            ChallengeStatus::Active,
            ChallengeStatus::Completed,
            ChallengeStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ChallengeStatus>(), Ok(status));
        }
        assert!("paused".parse::<ChallengeStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ChallengeStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_new_challenge_starts_at_day_one() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let challenge = Challenge::new("user-1", start);
        assert_eq!(challenge.current_day, 1);
        assert!(challenge.is_active());
        assert!(challenge.last_completed_date.is_none());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let session = Session {
            token: new_id(),
            user_id: "u".to_string(),
            created_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };
        assert!(!session.is_expired(now));
        assert!(session.is_expired(now + chrono::Duration::hours(2)));
    }
}
