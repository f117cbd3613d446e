//! SQLite Store - the hosted-database backend
//!
//! One database file holding five tables. Dates are stored as `YYYY-MM-DD`
//! text and timestamps as fixed-width RFC 3339 text so both sort correctly.
//!
//! ```text
//! users           (id PK, email UNIQUE, full_name, password_hash, created_at)
//! sessions        (token PK, user_id, created_at, expires_at)
//! challenges      (id PK, user_id, start_date, current_day, status,
//!                  last_completed_date, created_at)
//! daily_progress  (id PK, user_id, date, habit_id, completed, created_at,
//!                  updated_at, UNIQUE(user_id, date, habit_id))
//! journal_entries (id PK, user_id, date, content, created_at, updated_at,
//!                  UNIQUE(user_id, date))
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, ErrorCode, OpenFlags, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::storage::store::HabitStore;
use crate::storage::types::{
    new_id, Challenge, ChallengeStatus, ChallengeUpdate, DailyProgress, JournalEntry, Session,
    User, UserRecord,
};
use crate::storage::{StorageError, StorageResult};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS challenges (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        start_date TEXT NOT NULL,
        current_day INTEGER NOT NULL DEFAULT 1,
        status TEXT NOT NULL DEFAULT 'active',
        last_completed_date TEXT,
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_challenges_user ON challenges(user_id, created_at);

    CREATE TABLE IF NOT EXISTS daily_progress (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        habit_id TEXT NOT NULL,
        completed INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, date, habit_id)
    );

    CREATE TABLE IF NOT EXISTS journal_entries (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (user_id, date)
    );
";

const CHALLENGE_COLUMNS: &str =
    "id, user_id, start_date, current_day, status, last_completed_date, created_at";

const PROGRESS_COLUMNS: &str = "id, user_id, date, habit_id, completed, created_at, updated_at";

const JOURNAL_COLUMNS: &str = "id, user_id, date, content, created_at, updated_at";

/// SQLite-backed habit store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create or open the database inside `data_dir`
    pub fn open(data_dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join("ansuryx.db");

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            ",
        )?;
        conn.execute_batch(SCHEMA)?;

        tracing::debug!(path = ?path, "Opened SQLite store");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        f(&mut conn)
    }
}

fn timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Parse a text column, reporting failures as a conversion error on `idx`
fn text_col<T, E>(
    idx: usize,
    value: String,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    parse(&value).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn parse_ts(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    text_col(idx, value, |s| s.parse::<DateTime<Utc>>())
}

fn parse_date(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    text_col(idx, value, |s| s.parse::<NaiveDate>())
}

fn user_record_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        user: User {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            created_at: parse_ts(4, row.get(4)?)?,
        },
        password_hash: row.get(3)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        token: row.get(0)?,
        user_id: row.get(1)?,
        created_at: parse_ts(2, row.get(2)?)?,
        expires_at: parse_ts(3, row.get(3)?)?,
    })
}

fn challenge_from_row(row: &Row<'_>) -> rusqlite::Result<Challenge> {
    let last_completed: Option<String> = row.get(5)?;
    Ok(Challenge {
        id: row.get(0)?,
        user_id: row.get(1)?,
        start_date: parse_date(2, row.get(2)?)?,
        current_day: row.get(3)?,
        status: text_col(4, row.get(4)?, |s| s.parse::<ChallengeStatus>())?,
        last_completed_date: last_completed.map(|s| parse_date(5, s)).transpose()?,
        created_at: parse_ts(6, row.get(6)?)?,
    })
}

fn progress_from_row(row: &Row<'_>) -> rusqlite::Result<DailyProgress> {
    Ok(DailyProgress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(2, row.get(2)?)?,
        habit_id: row.get(3)?,
        completed: row.get(4)?,
        created_at: parse_ts(5, row.get(5)?)?,
        updated_at: parse_ts(6, row.get(6)?)?,
    })
}

fn journal_from_row(row: &Row<'_>) -> rusqlite::Result<JournalEntry> {
    Ok(JournalEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_date(2, row.get(2)?)?,
        content: row.get(3)?,
        created_at: parse_ts(4, row.get(4)?)?,
        updated_at: parse_ts(5, row.get(5)?)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn select_challenge(conn: &Connection, challenge_id: &str) -> StorageResult<Challenge> {
    conn.query_row(
        &format!("SELECT {} FROM challenges WHERE id = ?", CHALLENGE_COLUMNS),
        params![challenge_id],
        challenge_from_row,
    )
    .optional()?
    .ok_or_else(|| StorageError::NotFound(format!("challenge {}", challenge_id)))
}

#[async_trait]
impl HabitStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
    }

    async fn create_user(&self, record: UserRecord) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, full_name, password_hash, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    record.user.id,
                    record.user.email,
                    record.user.full_name,
                    record.password_hash,
                    timestamp(record.user.created_at),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StorageError::Conflict("User already registered".to_string())
                } else {
                    e.into()
                }
            })?;
            Ok(())
        })
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, email, full_name, password_hash, created_at
                     FROM users WHERE email = ?",
                    params![email],
                    user_record_from_row,
                )
                .optional()?)
        })
    }

    async fn find_user(&self, user_id: &str) -> StorageResult<Option<User>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, email, full_name, password_hash, created_at
                     FROM users WHERE id = ?",
                    params![user_id],
                    user_record_from_row,
                )
                .optional()?
                .map(|record| record.user))
        })
    }

    async fn update_user_name(
        &self,
        user_id: &str,
        full_name: Option<String>,
    ) -> StorageResult<User> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET full_name = ? WHERE id = ?",
                params![full_name, user_id],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(format!("user {}", user_id)));
            }
            let record = conn.query_row(
                "SELECT id, email, full_name, password_hash, created_at
                 FROM users WHERE id = ?",
                params![user_id],
                user_record_from_row,
            )?;
            Ok(record.user)
        })
    }

    async fn create_session(&self, session: Session) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at)
                 VALUES (?, ?, ?, ?)",
                params![
                    session.token,
                    session.user_id,
                    timestamp(session.created_at),
                    timestamp(session.expires_at),
                ],
            )?;
            Ok(())
        })
    }

    async fn find_session(&self, token: &str) -> StorageResult<Option<Session>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT token, user_id, created_at, expires_at
                     FROM sessions WHERE token = ?",
                    params![token],
                    session_from_row,
                )
                .optional()?)
        })
    }

    async fn delete_session(&self, token: &str) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?", params![token])?;
            Ok(())
        })
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        self.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM sessions WHERE expires_at <= ?",
                params![timestamp(now)],
            )?)
        })
    }

    async fn latest_challenge(&self, user_id: &str) -> StorageResult<Option<Challenge>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {} FROM challenges WHERE user_id = ?
                         ORDER BY created_at DESC, rowid DESC LIMIT 1",
                        CHALLENGE_COLUMNS
                    ),
                    params![user_id],
                    challenge_from_row,
                )
                .optional()?)
        })
    }

    async fn list_challenges(&self, user_id: &str) -> StorageResult<Vec<Challenge>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM challenges WHERE user_id = ?
                 ORDER BY created_at DESC, rowid DESC",
                CHALLENGE_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id], challenge_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    async fn insert_challenge(&self, challenge: Challenge) -> StorageResult<Challenge> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO challenges ({}) VALUES (?, ?, ?, ?, ?, ?, ?)",
                    CHALLENGE_COLUMNS
                ),
                params![
                    challenge.id,
                    challenge.user_id,
                    date(challenge.start_date),
                    challenge.current_day,
                    challenge.status.as_str(),
                    challenge.last_completed_date.map(date),
                    timestamp(challenge.created_at),
                ],
            )?;
            Ok(challenge)
        })
    }

    async fn update_challenge(
        &self,
        challenge_id: &str,
        update: &ChallengeUpdate,
    ) -> StorageResult<Challenge> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE challenges
                 SET current_day = ?, last_completed_date = ?, status = ?
                 WHERE id = ?",
                params![
                    update.current_day,
                    date(update.last_completed_date),
                    update.status.as_str(),
                    challenge_id,
                ],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(format!("challenge {}", challenge_id)));
            }
            select_challenge(conn, challenge_id)
        })
    }

    async fn set_challenge_status(
        &self,
        challenge_id: &str,
        status: ChallengeStatus,
    ) -> StorageResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE challenges SET status = ? WHERE id = ?",
                params![status.as_str(), challenge_id],
            )?;
            if changed == 0 {
                return Err(StorageError::NotFound(format!("challenge {}", challenge_id)));
            }
            Ok(())
        })
    }

    async fn progress_for_date(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> StorageResult<Vec<DailyProgress>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM daily_progress WHERE user_id = ? AND date = ?",
                PROGRESS_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id, date(day)], progress_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    async fn list_progress(&self, user_id: &str) -> StorageResult<Vec<DailyProgress>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM daily_progress WHERE user_id = ? ORDER BY date, habit_id",
                PROGRESS_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id], progress_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    async fn upsert_progress(
        &self,
        user_id: &str,
        day: NaiveDate,
        habit_id: &str,
    ) -> StorageResult<DailyProgress> {
        self.with_conn(|conn| {
            let now = timestamp(Utc::now());
            conn.execute(
                "INSERT INTO daily_progress
                    (id, user_id, date, habit_id, completed, created_at, updated_at)
                 VALUES (?, ?, ?, ?, 1, ?, ?)
                 ON CONFLICT (user_id, date, habit_id)
                 DO UPDATE SET completed = 1, updated_at = excluded.updated_at",
                params![new_id(), user_id, date(day), habit_id, now, now],
            )?;
            Ok(conn.query_row(
                &format!(
                    "SELECT {} FROM daily_progress
                     WHERE user_id = ? AND date = ? AND habit_id = ?",
                    PROGRESS_COLUMNS
                ),
                params![user_id, date(day), habit_id],
                progress_from_row,
            )?)
        })
    }

    async fn delete_progress(
        &self,
        user_id: &str,
        day: NaiveDate,
        habit_id: &str,
    ) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM daily_progress WHERE user_id = ? AND date = ? AND habit_id = ?",
                params![user_id, date(day), habit_id],
            )?;
            Ok(())
        })
    }

    async fn clear_progress(&self, user_id: &str, day: NaiveDate) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM daily_progress WHERE user_id = ? AND date = ?",
                params![user_id, date(day)],
            )?;
            Ok(())
        })
    }

    async fn upsert_journal(
        &self,
        user_id: &str,
        day: NaiveDate,
        content: &str,
    ) -> StorageResult<JournalEntry> {
        self.with_conn(|conn| {
            let now = timestamp(Utc::now());
            conn.execute(
                "INSERT INTO journal_entries (id, user_id, date, content, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT (user_id, date)
                 DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
                params![new_id(), user_id, date(day), content, now, now],
            )?;
            Ok(conn.query_row(
                &format!(
                    "SELECT {} FROM journal_entries WHERE user_id = ? AND date = ?",
                    JOURNAL_COLUMNS
                ),
                params![user_id, date(day)],
                journal_from_row,
            )?)
        })
    }

    async fn list_journal(&self, user_id: &str) -> StorageResult<Vec<JournalEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {} FROM journal_entries WHERE user_id = ? ORDER BY date DESC",
                JOURNAL_COLUMNS
            ))?;
            let rows = stmt.query_map(params![user_id], journal_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }
}
