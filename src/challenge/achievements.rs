//! Achievement milestones unlocked by the current streak

use serde::Serialize;

use crate::habits::{Milestone, ACHIEVEMENT_MILESTONES};

/// Milestones reached at `streak`
pub fn unlocked(streak: u32) -> Vec<&'static Milestone> {
    ACHIEVEMENT_MILESTONES
        .iter()
        .filter(|m| streak >= m.days)
        .collect()
}

/// The next milestone still ahead, if any
pub fn next(streak: u32) -> Option<&'static Milestone> {
    ACHIEVEMENT_MILESTONES.iter().find(|m| streak < m.days)
}

/// Progress towards the next milestone, in percent (100 when all are unlocked)
pub fn progress_to_next(streak: u32) -> f64 {
    match next(streak) {
        Some(m) => streak as f64 / m.days as f64 * 100.0,
        None => 100.0,
    }
}

/// One milestone with its unlock state
#[derive(Debug, Clone, Serialize)]
pub struct AchievementStatus {
    #[serde(flatten)]
    pub milestone: Milestone,
    pub unlocked: bool,
}

/// Everything the achievements view shows
#[derive(Debug, Clone, Serialize)]
pub struct AchievementSummary {
    pub current_streak: u32,
    pub unlocked_count: usize,
    pub total: usize,
    pub achievements: Vec<AchievementStatus>,
    pub next: Option<Milestone>,
    pub days_to_next: Option<u32>,
    pub progress_to_next: f64,
}

impl AchievementSummary {
    pub fn for_streak(streak: u32) -> Self {
        let achievements: Vec<AchievementStatus> = ACHIEVEMENT_MILESTONES
            .iter()
            .map(|m| AchievementStatus {
                milestone: *m,
                unlocked: streak >= m.days,
            })
            .collect();
        let upcoming = next(streak);

        Self {
            current_streak: streak,
            unlocked_count: achievements.iter().filter(|a| a.unlocked).count(),
            total: ACHIEVEMENT_MILESTONES.len(),
            achievements,
            next: upcoming.copied(),
            days_to_next: upcoming.map(|m| m.days - streak),
            progress_to_next: progress_to_next(streak),
        }
    }
}
