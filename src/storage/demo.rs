//! Demo Store - file-backed emulation of the table store
//!
//! Keeps every table in memory and rewrites a single JSON document after
//! each mutation, so a demo install needs no database. Challenges are keyed
//! by owner: starting a new one replaces the previous record, which keeps
//! at most one challenge (and so at most one active challenge) per user.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::storage::store::HabitStore;
use crate::storage::types::{
    new_id, Challenge, ChallengeStatus, ChallengeUpdate, DailyProgress, JournalEntry, Session,
    User, UserRecord,
};
use crate::storage::{StorageError, StorageResult};

/// Everything the demo store holds
#[derive(Debug, Default, Serialize, Deserialize)]
struct DemoData {
    /// email → account
    #[serde(default)]
    users: BTreeMap<String, UserRecord>,
    /// token → session
    #[serde(default)]
    sessions: HashMap<String, Session>,
    /// user id → challenge
    #[serde(default)]
    challenges: HashMap<String, Challenge>,
    #[serde(default)]
    progress: Vec<DailyProgress>,
    #[serde(default)]
    journal: Vec<JournalEntry>,
}

/// File name of the persisted demo document
pub const DEMO_DOCUMENT: &str = "ansuryx-demo.json";

/// In-memory habit store with optional JSON persistence
pub struct DemoStore {
    data: Mutex<DemoData>,
    path: Option<PathBuf>,
}

impl DemoStore {
    /// Open (or create) the demo document inside `data_dir`
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(DEMO_DOCUMENT);

        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                DemoData::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            DemoData::default()
        };

        tracing::debug!(path = ?path, users = data.users.len(), "Opened demo store");

        Ok(Self {
            data: Mutex::new(data),
            path: Some(path),
        })
    }

    /// A store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            data: Mutex::new(DemoData::default()),
            path: None,
        }
    }

    fn read<T>(&self, f: impl FnOnce(&DemoData) -> StorageResult<T>) -> StorageResult<T> {
        let data = self
            .data
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        f(&data)
    }

    fn write<T>(&self, f: impl FnOnce(&mut DemoData) -> StorageResult<T>) -> StorageResult<T> {
        let mut data = self
            .data
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        let result = f(&mut data)?;
        self.persist(&data)?;
        Ok(result)
    }

    fn persist(&self, data: &DemoData) -> StorageResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn find_challenge_mut<'a>(
    data: &'a mut DemoData,
    challenge_id: &str,
) -> StorageResult<&'a mut Challenge> {
    data.challenges
        .values_mut()
        .find(|c| c.id == challenge_id)
        .ok_or_else(|| StorageError::NotFound(format!("challenge {}", challenge_id)))
}

#[async_trait]
impl HabitStore for DemoStore {
    fn backend(&self) -> &'static str {
        "demo"
    }

    async fn ping(&self) -> StorageResult<()> {
        self.read(|_| Ok(()))
    }

    async fn create_user(&self, record: UserRecord) -> StorageResult<()> {
        self.write(|data| {
            if data.users.contains_key(&record.user.email) {
                return Err(StorageError::Conflict("User already registered".to_string()));
            }
            data.users.insert(record.user.email.clone(), record);
            Ok(())
        })
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        self.read(|data| Ok(data.users.get(email).cloned()))
    }

    async fn find_user(&self, user_id: &str) -> StorageResult<Option<User>> {
        self.read(|data| {
            Ok(data
                .users
                .values()
                .find(|r| r.user.id == user_id)
                .map(|r| r.user.clone()))
        })
    }

    async fn update_user_name(
        &self,
        user_id: &str,
        full_name: Option<String>,
    ) -> StorageResult<User> {
        self.write(|data| {
            let record = data
                .users
                .values_mut()
                .find(|r| r.user.id == user_id)
                .ok_or_else(|| StorageError::NotFound(format!("user {}", user_id)))?;
            record.user.full_name = full_name;
            Ok(record.user.clone())
        })
    }

    async fn create_session(&self, session: Session) -> StorageResult<()> {
        self.write(|data| {
            data.sessions.insert(session.token.clone(), session);
            Ok(())
        })
    }

    async fn find_session(&self, token: &str) -> StorageResult<Option<Session>> {
        self.read(|data| Ok(data.sessions.get(token).cloned()))
    }

    async fn delete_session(&self, token: &str) -> StorageResult<()> {
        self.write(|data| {
            data.sessions.remove(token);
            Ok(())
        })
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        self.write(|data| {
            let before = data.sessions.len();
            data.sessions.retain(|_, s| !s.is_expired(now));
            Ok(before - data.sessions.len())
        })
    }

    async fn latest_challenge(&self, user_id: &str) -> StorageResult<Option<Challenge>> {
        self.read(|data| Ok(data.challenges.get(user_id).cloned()))
    }

    async fn list_challenges(&self, user_id: &str) -> StorageResult<Vec<Challenge>> {
        self.read(|data| Ok(data.challenges.get(user_id).cloned().into_iter().collect()))
    }

    async fn insert_challenge(&self, challenge: Challenge) -> StorageResult<Challenge> {
        self.write(|data| {
            data.challenges
                .insert(challenge.user_id.clone(), challenge.clone());
            Ok(challenge)
        })
    }

    async fn update_challenge(
        &self,
        challenge_id: &str,
        update: &ChallengeUpdate,
    ) -> StorageResult<Challenge> {
        self.write(|data| {
            let challenge = find_challenge_mut(data, challenge_id)?;
            challenge.apply(update);
            Ok(challenge.clone())
        })
    }

    async fn set_challenge_status(
        &self,
        challenge_id: &str,
        status: ChallengeStatus,
    ) -> StorageResult<()> {
        self.write(|data| {
            find_challenge_mut(data, challenge_id)?.status = status;
            Ok(())
        })
    }

    async fn progress_for_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StorageResult<Vec<DailyProgress>> {
        self.read(|data| {
            Ok(data
                .progress
                .iter()
                .filter(|p| p.user_id == user_id && p.date == date)
                .cloned()
                .collect())
        })
    }

    async fn list_progress(&self, user_id: &str) -> StorageResult<Vec<DailyProgress>> {
        self.read(|data| {
            let mut rows: Vec<DailyProgress> = data
                .progress
                .iter()
                .filter(|p| p.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.habit_id.cmp(&b.habit_id)));
            Ok(rows)
        })
    }

    async fn upsert_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
        habit_id: &str,
    ) -> StorageResult<DailyProgress> {
        self.write(|data| {
            let now = Utc::now();
            if let Some(existing) = data
                .progress
                .iter_mut()
                .find(|p| p.user_id == user_id && p.date == date && p.habit_id == habit_id)
            {
                existing.completed = true;
                existing.updated_at = now;
                return Ok(existing.clone());
            }

            let row = DailyProgress {
                id: new_id(),
                user_id: user_id.to_string(),
                date,
                habit_id: habit_id.to_string(),
                completed: true,
                created_at: now,
                updated_at: now,
            };
            data.progress.push(row.clone());
            Ok(row)
        })
    }

    async fn delete_progress(
        &self,
        user_id: &str,
        date: NaiveDate,
        habit_id: &str,
    ) -> StorageResult<()> {
        self.write(|data| {
            data.progress
                .retain(|p| !(p.user_id == user_id && p.date == date && p.habit_id == habit_id));
            Ok(())
        })
    }

    async fn clear_progress(&self, user_id: &str, date: NaiveDate) -> StorageResult<()> {
        self.write(|data| {
            data.progress
                .retain(|p| !(p.user_id == user_id && p.date == date));
            Ok(())
        })
    }

    async fn upsert_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
        content: &str,
    ) -> StorageResult<JournalEntry> {
        self.write(|data| {
            let now = Utc::now();
            if let Some(existing) = data
                .journal
                .iter_mut()
                .find(|e| e.user_id == user_id && e.date == date)
            {
                existing.content = content.to_string();
                existing.updated_at = now;
                return Ok(existing.clone());
            }

            let entry = JournalEntry {
                id: new_id(),
                user_id: user_id.to_string(),
                date,
                content: content.to_string(),
                created_at: now,
                updated_at: now,
            };
            data.journal.push(entry.clone());
            Ok(entry)
        })
    }

    async fn list_journal(&self, user_id: &str) -> StorageResult<Vec<JournalEntry>> {
        self.read(|data| {
            let mut entries: Vec<JournalEntry> = data
                .journal
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(entries)
        })
    }
}
