//! Challenge Tracker
//!
//! Service that owns the challenge lifecycle for a user:
//!
//! ```text
//! start ──► active ──(all habits done on day N)──► active (current_day = N)
//!              │                                      │
//!              │                          N ≥ 40 ─────┴──► completed
//!              └──(reset)──► failed, and a new active challenge starts
//! ```
//!
//! Every operation takes `today` explicitly so callers decide the calendar.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::challenge::streak::{self, ProgressMap};
use crate::challenge::{ChallengeError, ChallengeResult};
use crate::habits::{find_habit, CHALLENGE_DURATION, DAILY_HABITS};
use crate::storage::{Challenge, ChallengeStatus, HabitStore};

/// Result of toggling one habit
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub habit_id: String,
    pub completed: bool,
    pub progress: ProgressMap,
    pub completion_rate: f64,
    pub challenge: Option<Challenge>,
    /// Every habit for today is now done
    pub day_completed: bool,
    /// This toggle finished the whole challenge
    pub challenge_completed: bool,
}

/// Snapshot of a user's standing for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub challenge: Option<Challenge>,
    pub progress: ProgressMap,
    pub streak: u32,
    pub streak_broken: bool,
    pub completion_rate: f64,
    pub days_remaining: u32,
    pub day_label: String,
    pub duration: u32,
}

/// Lifetime statistics shown on the profile
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProfileStats {
    pub longest_streak: u32,
    pub challenges_completed: usize,
    pub total_days: usize,
}

/// Challenge lifecycle service
#[derive(Clone)]
pub struct ChallengeTracker {
    store: Arc<dyn HabitStore>,
}

impl ChallengeTracker {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }

    /// The user's most recent challenge
    pub async fn load_challenge(&self, user_id: &str) -> ChallengeResult<Option<Challenge>> {
        Ok(self.store.latest_challenge(user_id).await?)
    }

    /// Completion state of every habit for `today`
    pub async fn todays_progress(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ChallengeResult<ProgressMap> {
        let rows = self.store.progress_for_date(user_id, today).await?;
        Ok(streak::progress_map(
            rows.iter().map(|p| (p.habit_id.as_str(), p.completed)),
        ))
    }

    /// Begin a new challenge on `today` at day 1
    pub async fn start_new_challenge(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ChallengeResult<Challenge> {
        let challenge = self
            .store
            .insert_challenge(Challenge::new(user_id, today))
            .await?;

        tracing::info!(
            user_id = %user_id,
            challenge_id = %challenge.id,
            start_date = %challenge.start_date,
            "Started new challenge"
        );

        Ok(challenge)
    }

    /// Flip one habit for `today`, advancing the challenge when the day is complete
    pub async fn toggle_habit(
        &self,
        user_id: &str,
        habit_id: &str,
        today: NaiveDate,
    ) -> ChallengeResult<ToggleOutcome> {
        if find_habit(habit_id).is_none() {
            return Err(ChallengeError::UnknownHabit(habit_id.to_string()));
        }

        let before = self.todays_progress(user_id, today).await?;
        let completed = !before.get(habit_id).copied().unwrap_or(false);

        if completed {
            self.store.upsert_progress(user_id, today, habit_id).await?;
        } else {
            self.store.delete_progress(user_id, today, habit_id).await?;
        }

        // Concurrent toggles may have written other habits since `before`
        let progress = self.todays_progress(user_id, today).await?;

        tracing::debug!(
            user_id = %user_id,
            habit_id = %habit_id,
            completed,
            date = %today,
            "Toggled habit"
        );

        let day_completed = streak::all_completed(&progress);
        let mut challenge = self.store.latest_challenge(user_id).await?;
        let mut challenge_completed = false;

        if day_completed {
            if let Some(current) = challenge.as_ref().filter(|c| c.is_active()) {
                let updated = self.update_challenge_progress(current, today).await?;
                challenge_completed = updated.status == ChallengeStatus::Completed;
                challenge = Some(updated);
            }
        }

        Ok(ToggleOutcome {
            habit_id: habit_id.to_string(),
            completed,
            completion_rate: streak::completion_rate(&progress),
            progress,
            challenge,
            day_completed,
            challenge_completed,
        })
    }

    /// Record `today` as fully completed for `challenge`
    pub async fn update_challenge_progress(
        &self,
        challenge: &Challenge,
        today: NaiveDate,
    ) -> ChallengeResult<Challenge> {
        let update = streak::day_completion_update(challenge, today);
        let updated = self.store.update_challenge(&challenge.id, &update).await?;

        if updated.status == ChallengeStatus::Completed {
            tracing::info!(
                user_id = %updated.user_id,
                challenge_id = %updated.id,
                "Challenge completed"
            );
        } else {
            tracing::debug!(
                challenge_id = %updated.id,
                current_day = updated.current_day,
                "Challenge day completed"
            );
        }

        Ok(updated)
    }

    /// Fail the current challenge (if any) and start over from day 1
    pub async fn reset_challenge(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> ChallengeResult<Challenge> {
        if let Some(current) = self.store.latest_challenge(user_id).await? {
            self.store
                .set_challenge_status(&current.id, ChallengeStatus::Failed)
                .await?;
            tracing::info!(
                user_id = %user_id,
                challenge_id = %current.id,
                current_day = current.current_day,
                "Challenge reset, marked failed"
            );
        }

        let fresh = self.start_new_challenge(user_id, today).await?;
        self.store.clear_progress(user_id, today).await?;
        Ok(fresh)
    }

    /// Current streak in days
    pub async fn current_streak(&self, user_id: &str, today: NaiveDate) -> ChallengeResult<u32> {
        let challenge = self.store.latest_challenge(user_id).await?;
        Ok(streak::current_streak(challenge.as_ref(), today))
    }

    /// Everything the dashboard shows for `today`
    pub async fn dashboard(&self, user_id: &str, today: NaiveDate) -> ChallengeResult<Dashboard> {
        let challenge = self.store.latest_challenge(user_id).await?;
        let progress = self.todays_progress(user_id, today).await?;

        Ok(Dashboard {
            streak: streak::current_streak(challenge.as_ref(), today),
            streak_broken: streak::is_streak_broken(challenge.as_ref(), today),
            completion_rate: streak::completion_rate(&progress),
            days_remaining: streak::days_remaining(challenge.as_ref()),
            day_label: streak::day_label(challenge.as_ref()),
            duration: CHALLENGE_DURATION,
            challenge,
            progress,
        })
    }

    /// Lifetime statistics across all of a user's challenges and progress
    pub async fn profile_stats(&self, user_id: &str) -> ChallengeResult<ProfileStats> {
        let challenges = self.store.list_challenges(user_id).await?;
        let rows = self.store.list_progress(user_id).await?;

        let longest_streak = challenges
            .iter()
            .filter(|c| c.last_completed_date.is_some())
            .map(|c| c.current_day)
            .max()
            .unwrap_or(0);

        let challenges_completed = challenges
            .iter()
            .filter(|c| c.status == ChallengeStatus::Completed)
            .count();

        let mut by_date: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
        for row in rows.iter().filter(|p| p.completed) {
            by_date.entry(row.date).or_default().insert(row.habit_id.as_str());
        }
        let total_days = by_date
            .values()
            .filter(|done| DAILY_HABITS.iter().all(|h| done.contains(h.id)))
            .count();

        Ok(ProfileStats {
            longest_streak,
            challenges_completed,
            total_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        ChallengeUpdate, DailyProgress, DemoStore, JournalEntry, Session, SqliteStore,
        StorageResult, User, UserRecord,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tempfile::tempdir;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, month, day).unwrap()
    }

    fn tracker() -> ChallengeTracker {
        ChallengeTracker::new(Arc::new(DemoStore::in_memory()))
    }

    async fn complete_day(tracker: &ChallengeTracker, user: &str, day: NaiveDate) -> ToggleOutcome {
        let mut last = None;
        for habit in DAILY_HABITS.iter() {
            last = Some(tracker.toggle_habit(user, habit.id, day).await.unwrap());
        }
        last.unwrap()
    }

    #[tokio::test]
    async fn test_start_new_challenge() {
        let tracker = tracker();
        let challenge = tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        assert_eq!(challenge.current_day, 1);
        assert_eq!(challenge.start_date, d(1, 1));
        assert_eq!(challenge.status, ChallengeStatus::Active);

        let loaded = tracker.load_challenge("u1").await.unwrap().unwrap();
        assert_eq!(loaded.id, challenge.id);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let tracker = tracker();
        let on = tracker.toggle_habit("u1", "water", d(1, 1)).await.unwrap();
        assert!(on.completed);
        assert_eq!(on.completion_rate, 20.0);

        let off = tracker.toggle_habit("u1", "water", d(1, 1)).await.unwrap();
        assert!(!off.completed);
        assert_eq!(off.completion_rate, 0.0);

        let progress = tracker.todays_progress("u1", d(1, 1)).await.unwrap();
        assert!(progress.values().all(|done| !done));
    }

    #[tokio::test]
    async fn test_unknown_habit_rejected() {
        let tracker = tracker();
        let err = tracker
            .toggle_habit("u1", "sleep", d(1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ChallengeError::UnknownHabit(_)));
    }

    #[tokio::test]
    async fn test_completing_all_habits_advances_challenge() {
        let tracker = tracker();
        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();

        let outcome = complete_day(&tracker, "u1", d(1, 3)).await;
        assert!(outcome.day_completed);
        assert!(!outcome.challenge_completed);

        let challenge = outcome.challenge.unwrap();
        assert_eq!(challenge.current_day, 3);
        assert_eq!(challenge.last_completed_date, Some(d(1, 3)));
        assert_eq!(tracker.current_streak("u1", d(1, 4)).await.unwrap(), 3);
        assert_eq!(tracker.current_streak("u1", d(1, 5)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_day_does_not_advance() {
        let tracker = tracker();
        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        tracker.toggle_habit("u1", "prayer", d(1, 2)).await.unwrap();
        let outcome = tracker.toggle_habit("u1", "water", d(1, 2)).await.unwrap();

        assert!(!outcome.day_completed);
        let challenge = outcome.challenge.unwrap();
        assert_eq!(challenge.current_day, 1);
        assert!(challenge.last_completed_date.is_none());
    }

    #[tokio::test]
    async fn test_progress_without_challenge_is_still_recorded() {
        let tracker = tracker();
        let outcome = complete_day(&tracker, "u1", d(1, 1)).await;
        assert!(outcome.day_completed);
        assert!(outcome.challenge.is_none());
    }

    #[tokio::test]
    async fn test_day_forty_completes_challenge() {
        let tracker = tracker();
        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();

        let outcome = complete_day(&tracker, "u1", d(2, 9)).await;
        assert!(outcome.challenge_completed);
        let challenge = outcome.challenge.unwrap();
        assert_eq!(challenge.current_day, 40);
        assert_eq!(challenge.status, ChallengeStatus::Completed);

        let stats = tracker.profile_stats("u1").await.unwrap();
        assert_eq!(stats.challenges_completed, 1);
        assert_eq!(stats.longest_streak, 40);
        assert_eq!(stats.total_days, 1);
    }

    #[tokio::test]
    async fn test_reset_fails_and_restarts() {
        let tracker = tracker();
        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        tracker.toggle_habit("u1", "water", d(1, 5)).await.unwrap();

        let fresh = tracker.reset_challenge("u1", d(1, 5)).await.unwrap();
        assert_eq!(fresh.start_date, d(1, 5));
        assert_eq!(fresh.current_day, 1);
        assert!(fresh.is_active());

        let progress = tracker.todays_progress("u1", d(1, 5)).await.unwrap();
        assert!(progress.values().all(|done| !done));
    }

    #[tokio::test]
    async fn test_dashboard() {
        let tracker = tracker();
        let empty = tracker.dashboard("u1", d(1, 1)).await.unwrap();
        assert!(empty.challenge.is_none());
        assert_eq!(empty.days_remaining, 40);
        assert_eq!(empty.streak, 0);

        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        complete_day(&tracker, "u1", d(1, 2)).await;

        let board = tracker.dashboard("u1", d(1, 2)).await.unwrap();
        assert_eq!(board.streak, 2);
        assert_eq!(board.completion_rate, 100.0);
        assert_eq!(board.days_remaining, 38);
        assert_eq!(board.day_label, "Day 2 of 40");
        assert!(!board.streak_broken);

        let later = tracker.dashboard("u1", d(1, 6)).await.unwrap();
        assert!(later.streak_broken);
        assert_eq!(later.streak, 0);
        assert_eq!(later.completion_rate, 0.0);
    }

    async fn sqlite_tracker(dir: &std::path::Path) -> (ChallengeTracker, Arc<dyn HabitStore>) {
        let store: Arc<dyn HabitStore> = Arc::new(SqliteStore::open(dir).unwrap());
        store
            .create_user(UserRecord {
                user: User {
                    id: "u1".to_string(),
                    email: "u1@example.com".to_string(),
                    full_name: None,
                    created_at: Utc::now(),
                },
                password_hash: "unused".to_string(),
            })
            .await
            .unwrap();
        (ChallengeTracker::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn test_reset_keeps_failed_challenge_in_history() {
        let dir = tempdir().unwrap();
        let (tracker, store) = sqlite_tracker(dir.path()).await;

        let first = tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        complete_day(&tracker, "u1", d(1, 2)).await;

        let fresh = tracker.reset_challenge("u1", d(1, 5)).await.unwrap();
        assert_ne!(fresh.id, first.id);

        let history = store.list_challenges("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        let old = history.iter().find(|c| c.id == first.id).unwrap();
        assert_eq!(old.status, ChallengeStatus::Failed);
        assert_eq!(old.current_day, 2);

        let latest = tracker.load_challenge("u1").await.unwrap().unwrap();
        assert_eq!(latest.id, fresh.id);
        assert!(latest.is_active());
    }

    #[tokio::test]
    async fn test_failed_challenge_not_advanced() {
        let dir = tempdir().unwrap();
        let (tracker, store) = sqlite_tracker(dir.path()).await;

        let challenge = tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        store
            .set_challenge_status(&challenge.id, ChallengeStatus::Failed)
            .await
            .unwrap();

        let outcome = complete_day(&tracker, "u1", d(1, 3)).await;
        assert!(outcome.day_completed);
        assert!(!outcome.challenge_completed);

        let unchanged = outcome.challenge.unwrap();
        assert_eq!(unchanged.status, ChallengeStatus::Failed);
        assert_eq!(unchanged.current_day, 1);
        assert!(unchanged.last_completed_date.is_none());
    }

    #[tokio::test]
    async fn test_completed_challenge_not_advanced() {
        let tracker = tracker();
        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        complete_day(&tracker, "u1", d(2, 9)).await;

        let outcome = complete_day(&tracker, "u1", d(2, 10)).await;
        assert!(outcome.day_completed);
        assert!(!outcome.challenge_completed);

        let challenge = outcome.challenge.unwrap();
        assert_eq!(challenge.status, ChallengeStatus::Completed);
        assert_eq!(challenge.current_day, 40);
        assert_eq!(challenge.last_completed_date, Some(d(2, 9)));
    }

    /// Demo store that hands control back to the runtime after every day read
    struct YieldingStore {
        inner: DemoStore,
    }

    #[async_trait]
    impl HabitStore for YieldingStore {
        fn backend(&self) -> &'static str {
            self.inner.backend()
        }

        async fn ping(&self) -> StorageResult<()> {
            self.inner.ping().await
        }

        async fn create_user(&self, record: UserRecord) -> StorageResult<()> {
            self.inner.create_user(record).await
        }

        async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
            self.inner.find_user_by_email(email).await
        }

        async fn find_user(&self, user_id: &str) -> StorageResult<Option<User>> {
            self.inner.find_user(user_id).await
        }

        async fn update_user_name(
            &self,
            user_id: &str,
            full_name: Option<String>,
        ) -> StorageResult<User> {
            self.inner.update_user_name(user_id, full_name).await
        }

        async fn create_session(&self, session: Session) -> StorageResult<()> {
            self.inner.create_session(session).await
        }

        async fn find_session(&self, token: &str) -> StorageResult<Option<Session>> {
            self.inner.find_session(token).await
        }

        async fn delete_session(&self, token: &str) -> StorageResult<()> {
            self.inner.delete_session(token).await
        }

        async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StorageResult<usize> {
            self.inner.purge_expired_sessions(now).await
        }

        async fn latest_challenge(&self, user_id: &str) -> StorageResult<Option<Challenge>> {
            self.inner.latest_challenge(user_id).await
        }

        async fn list_challenges(&self, user_id: &str) -> StorageResult<Vec<Challenge>> {
            self.inner.list_challenges(user_id).await
        }

        async fn insert_challenge(&self, challenge: Challenge) -> StorageResult<Challenge> {
            self.inner.insert_challenge(challenge).await
        }

        async fn update_challenge(
            &self,
            challenge_id: &str,
            update: &ChallengeUpdate,
        ) -> StorageResult<Challenge> {
            self.inner.update_challenge(challenge_id, update).await
        }

        async fn set_challenge_status(
            &self,
            challenge_id: &str,
            status: ChallengeStatus,
        ) -> StorageResult<()> {
            self.inner.set_challenge_status(challenge_id, status).await
        }

        async fn progress_for_date(
            &self,
            user_id: &str,
            date: NaiveDate,
        ) -> StorageResult<Vec<DailyProgress>> {
            let rows = self.inner.progress_for_date(user_id, date).await;
            tokio::task::yield_now().await;
            rows
        }

        async fn list_progress(&self, user_id: &str) -> StorageResult<Vec<DailyProgress>> {
            self.inner.list_progress(user_id).await
        }

        async fn upsert_progress(
            &self,
            user_id: &str,
            date: NaiveDate,
            habit_id: &str,
        ) -> StorageResult<DailyProgress> {
            self.inner.upsert_progress(user_id, date, habit_id).await
        }

        async fn delete_progress(
            &self,
            user_id: &str,
            date: NaiveDate,
            habit_id: &str,
        ) -> StorageResult<()> {
            self.inner.delete_progress(user_id, date, habit_id).await
        }

        async fn clear_progress(&self, user_id: &str, date: NaiveDate) -> StorageResult<()> {
            self.inner.clear_progress(user_id, date).await
        }

        async fn upsert_journal(
            &self,
            user_id: &str,
            date: NaiveDate,
            content: &str,
        ) -> StorageResult<JournalEntry> {
            self.inner.upsert_journal(user_id, date, content).await
        }

        async fn list_journal(&self, user_id: &str) -> StorageResult<Vec<JournalEntry>> {
            self.inner.list_journal(user_id).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_last_toggles_complete_the_day() {
        let tracker = ChallengeTracker::new(Arc::new(YieldingStore {
            inner: DemoStore::in_memory(),
        }));
        tracker.start_new_challenge("u1", d(1, 1)).await.unwrap();
        for habit in ["prayer", "quran", "exercise"] {
            tracker.toggle_habit("u1", habit, d(1, 2)).await.unwrap();
        }

        let (water, journal) = tokio::join!(
            tracker.toggle_habit("u1", "water", d(1, 2)),
            tracker.toggle_habit("u1", "journal", d(1, 2)),
        );
        let (water, journal) = (water.unwrap(), journal.unwrap());
        assert!(water.completed && journal.completed);
        assert!(water.day_completed || journal.day_completed);

        let challenge = tracker.load_challenge("u1").await.unwrap().unwrap();
        assert_eq!(challenge.current_day, 2);
        assert_eq!(challenge.last_completed_date, Some(d(1, 2)));
    }
}
