//! AnsuryX Challenge Logic
//!
//! - **streak**: day-counter and streak arithmetic (pure functions)
//! - **achievements**: milestone unlocks derived from the streak
//! - **tracker**: `ChallengeTracker`, the lifecycle service over a store

pub mod achievements;
pub mod streak;
pub mod tracker;

pub use achievements::{AchievementStatus, AchievementSummary};
pub use streak::ProgressMap;
pub use tracker::{ChallengeTracker, Dashboard, ProfileStats, ToggleOutcome};

use thiserror::Error;

/// Errors raised by challenge operations
#[derive(Error, Debug)]
pub enum ChallengeError {
    /// Habit id is not one of the daily habits
    #[error("Unknown habit: {0}")]
    UnknownHabit(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for challenge operations
pub type ChallengeResult<T> = Result<T, ChallengeError>;
