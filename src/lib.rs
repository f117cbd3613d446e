//! # AnsuryX
//!
//! A 40-day habit challenge service. Each day a participant checks off five
//! habits; completing all five advances the challenge by a day, and forty
//! consecutive days earn a certificate.
//!
//! ## Features
//!
//! - **Challenge tracking**: day counter, streaks, automatic completion
//! - **Achievements**: milestones unlocked along the way
//! - **Journal**: one reflection per day, exportable as text, CSV or JSON
//! - **Certificate**: HTML certificate once the 40 days are done
//! - **Two backends**: SQLite database or a single JSON document
//!
//! ## Modules
//!
//! - [`habits`]: The habit catalogue, milestones and rules
//! - [`storage`]: Store trait and backends
//! - [`challenge`]: Streak arithmetic and the challenge tracker
//! - [`auth`]: Accounts and sessions
//! - [`journal`]: Daily reflections and export
//! - [`certificate`]: Completion certificate
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ansuryx::challenge::ChallengeTracker;
//! use ansuryx::storage::{open_store, StorageBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = open_store(StorageBackend::Demo, "./data".as_ref())?;
//!     let tracker = ChallengeTracker::new(store);
//!     let today = chrono::Local::now().date_naive();
//!
//!     tracker.start_new_challenge("user-1", today).await?;
//!     let outcome = tracker.toggle_habit("user-1", "prayer", today).await?;
//!
//!     println!("{:.0}% of today done", outcome.completion_rate);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod certificate;
pub mod challenge;
pub mod config;
pub mod habits;
pub mod journal;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    open_store, Challenge, ChallengeStatus, DailyProgress, HabitStore, JournalEntry,
    StorageBackend, StorageError, StorageResult, User,
};

pub use challenge::{
    AchievementSummary, ChallengeError, ChallengeTracker, Dashboard, ProfileStats, ToggleOutcome,
};

pub use auth::{AuthError, AuthService, SignedIn};

pub use journal::{ExportFormat, JournalError, JournalService};

pub use certificate::{CertificateError, CertificateStatus};

pub use habits::{Habit, Milestone, CHALLENGE_DURATION, DAILY_HABITS};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
