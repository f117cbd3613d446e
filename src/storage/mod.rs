//! AnsuryX Storage
//!
//! Persistence for users, sessions, challenges, daily progress and journal
//! entries:
//!
//! - **types**: Record types (Challenge, DailyProgress, JournalEntry, ...)
//! - **store**: The `HabitStore` trait both backends implement
//! - **sqlite**: SQLite database backend
//! - **demo**: JSON-document backend for running without a database
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use ansuryx::storage::{open_store, StorageBackend, HabitStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = open_store(StorageBackend::Sqlite, "./data".as_ref())?;
//!     store.ping().await?;
//!     Ok(())
//! }
//! ```

pub mod demo;
pub mod error;
pub mod sqlite;
pub mod store;
pub mod types;

pub use demo::DemoStore;
pub use error::{StorageError, StorageResult};
pub use sqlite::SqliteStore;
pub use store::HabitStore;
pub use types::{
    Challenge, ChallengeStatus, ChallengeUpdate, DailyProgress, JournalEntry, Session, User,
    UserRecord,
};

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Which backend holds the data
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database file
    #[default]
    Sqlite,
    /// JSON document, for trying the app without a database
    Demo,
}

impl std::str::FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "demo" => Ok(StorageBackend::Demo),
            other => Err(StorageError::NotFound(format!(
                "storage backend '{}' (use sqlite or demo)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Sqlite => write!(f, "sqlite"),
            StorageBackend::Demo => write!(f, "demo"),
        }
    }
}

/// Open the configured backend inside `data_dir`
pub fn open_store(backend: StorageBackend, data_dir: &Path) -> StorageResult<Arc<dyn HabitStore>> {
    let store: Arc<dyn HabitStore> = match backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(data_dir)?),
        StorageBackend::Demo => Arc::new(DemoStore::open(data_dir)?),
    };
    tracing::info!(backend = %backend, data_dir = ?data_dir, "Opened habit store");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("sqlite".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert_eq!("DEMO".parse::<StorageBackend>().unwrap(), StorageBackend::Demo);
        assert!("postgres".parse::<StorageBackend>().is_err());
    }
}
