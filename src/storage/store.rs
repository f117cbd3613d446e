//! Store abstraction
//!
//! Both backends expose the same table-style operations so the services
//! above never know which one they talk to.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::storage::types::{
    Challenge, ChallengeStatus, ChallengeUpdate, DailyProgress, JournalEntry, Session, User,
    UserRecord,
};
use crate::storage::StorageResult;

/// Persistence operations for users, sessions, challenges, progress and journals
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Backend name for health reporting ("sqlite" or "demo")
    fn backend(&self) -> &'static str;

    /// Cheap liveness check against the backing store
    async fn ping(&self) -> StorageResult<()>;

    // ---- users ----

    /// Insert a new account. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, record: UserRecord) -> StorageResult<()>;

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>>;

    async fn find_user(&self, user_id: &str) -> StorageResult<Option<User>>;

    async fn update_user_name(&self, user_id: &str, full_name: Option<String>)
        -> StorageResult<User>;

    // ---- sessions ----

    async fn create_session(&self, session: Session) -> StorageResult<()>;

    async fn find_session(&self, token: &str) -> StorageResult<Option<Session>>;

    async fn delete_session(&self, token: &str) -> StorageResult<()>;

    /// Remove sessions expired at `now`, returning how many were removed
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StorageResult<usize>;

    // ---- challenges ----

    /// Most recently created challenge for a user
    async fn latest_challenge(&self, user_id: &str) -> StorageResult<Option<Challenge>>;

    /// Every challenge the store holds for a user, newest first
    async fn list_challenges(&self, user_id: &str) -> StorageResult<Vec<Challenge>>;

    async fn insert_challenge(&self, challenge: Challenge) -> StorageResult<Challenge>;

    async fn update_challenge(
        &self,
        challenge_id: &str,
        update: &ChallengeUpdate,
    ) -> StorageResult<Challenge>;

    async fn set_challenge_status(
        &self,
        challenge_id: &str,
        status: ChallengeStatus,
    ) -> StorageResult<()>;

    // ---- daily progress ----

    async fn progress_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<DailyProgress>>;

    /// All progress rows for a user, oldest date first
    async fn list_progress(&self, user_id: &str) -> StorageResult<Vec<DailyProgress>>;

    /// Mark (user, date, habit) completed, inserting or updating the row
    async fn upsert_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
        habit_id: &str,
    ) -> StorageResult<DailyProgress>;

    async fn delete_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
        habit_id: &str,
    ) -> StorageResult<()>;

    /// Remove every progress row for (user, date)
    async fn clear_progress(&self, user_id: &str, date: NaiveDate) -> StorageResult<()>;

    // ---- journal ----

    /// Insert or overwrite the entry for (user, date)
    async fn upsert_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> StorageResult<JournalEntry>;

    /// Entries for a user, newest date first
    async fn list_journal(&self, user_id: &str) -> StorageResult<Vec<JournalEntry>>;
}
