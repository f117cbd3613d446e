//! Daily journal
//!
//! One reflection per user per day; saving again on the same day
//! overwrites. Entries can be exported as a document, CSV or JSON.

pub mod export;

pub use export::{ExportDocument, ExportFormat};

use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::{HabitStore, JournalEntry, User};

/// Longest accepted entry, in characters
pub const MAX_ENTRY_CHARS: usize = 20_000;

/// Journal errors
#[derive(Error, Debug)]
pub enum JournalError {
    /// Input rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rendering an export failed
    #[error("Export error: {0}")]
    Export(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Journal service over a habit store
#[derive(Clone)]
pub struct JournalService {
    store: Arc<dyn HabitStore>,
}

impl JournalService {
    pub fn new(store: Arc<dyn HabitStore>) -> Self {
        Self { store }
    }

    /// Save (or overwrite) the entry for `today`
    pub async fn save_entry(
        &self,
        user_id: &str,
        today: NaiveDate,
        content: &str,
    ) -> JournalResult<JournalEntry> {
        if content.trim().is_empty() {
            return Err(JournalError::Validation(
                "Journal entry cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_ENTRY_CHARS {
            return Err(JournalError::Validation(format!(
                "Journal entry exceeds maximum length of {} characters",
                MAX_ENTRY_CHARS
            )));
        }

        let entry = self.store.upsert_journal(user_id, today, content).await?;
        tracing::info!(user_id = %user_id, date = %today, "Saved journal entry");
        Ok(entry)
    }

    /// All entries, newest first
    pub async fn list_entries(&self, user_id: &str) -> JournalResult<Vec<JournalEntry>> {
        Ok(self.store.list_journal(user_id).await?)
    }

    /// The entry written on `today`, if any
    pub async fn today_entry(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> JournalResult<Option<JournalEntry>> {
        Ok(self
            .store
            .list_journal(user_id)
            .await?
            .into_iter()
            .find(|e| e.date == today))
    }

    /// Render every entry for download
    pub async fn export(&self, user: &User, format: ExportFormat) -> JournalResult<ExportDocument> {
        let entries = self.store.list_journal(&user.id).await?;
        let doc = export::render(&entries, user, format)?;
        tracing::info!(
            user_id = %user.id,
            entries = entries.len(),
            filename = %doc.filename,
            "Exported journal"
        );
        Ok(doc)
    }
}
