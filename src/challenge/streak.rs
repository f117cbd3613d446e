//! Streak and day-counter arithmetic
//!
//! Pure functions over a challenge and the current date. Day numbers are
//! inclusive: the start date is day 1.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::habits::{CHALLENGE_DURATION, DAILY_HABITS};
use crate::storage::{Challenge, ChallengeStatus, ChallengeUpdate};

/// habit id → completed today
pub type ProgressMap = BTreeMap<String, bool>;

/// Day number of `today` within a challenge started on `start_date`
pub fn days_since_start(start_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - start_date).num_days() + 1
}

/// Fields to write once every habit for `today` is done
pub fn day_completion_update(challenge: &Challenge, today: NaiveDate) -> ChallengeUpdate {
    let days = days_since_start(challenge.start_date, today);
    let capped = days.clamp(1, CHALLENGE_DURATION as i64) as u32;

    ChallengeUpdate {
        current_day: capped,
        last_completed_date: today,
        status: if days >= CHALLENGE_DURATION as i64 {
            ChallengeStatus::Completed
        } else {
            ChallengeStatus::Active
        },
    }
}

/// Current streak in days
///
/// Zero without a challenge or a completed day; zero once more than one
/// day has passed since the last completed day; otherwise the day counter.
pub fn current_streak(challenge: Option<&Challenge>, today: NaiveDate) -> u32 {
    let Some(challenge) = challenge else {
        return 0;
    };
    let Some(last_completed) = challenge.last_completed_date else {
        return 0;
    };

    if (today - last_completed).num_days() > 1 {
        return 0;
    }

    challenge.current_day
}

/// Whether the streak has lapsed: a completed day exists but is older than yesterday
pub fn is_streak_broken(challenge: Option<&Challenge>, today: NaiveDate) -> bool {
    challenge
        .and_then(|c| c.last_completed_date)
        .map(|last| (today - last).num_days() > 1)
        .unwrap_or(false)
}

/// Build the full map for all habits from the rows stored for a day
pub fn progress_map<'a>(completed_ids: impl IntoIterator<Item = (&'a str, bool)>) -> ProgressMap {
    let mut map: ProgressMap = DAILY_HABITS
        .iter()
        .map(|h| (h.id.to_string(), false))
        .collect();

    for (habit_id, completed) in completed_ids {
        if let Some(slot) = map.get_mut(habit_id) {
            *slot = completed;
        }
    }

    map
}

/// True when every habit in the catalogue is marked done
pub fn all_completed(progress: &ProgressMap) -> bool {
    DAILY_HABITS
        .iter()
        .all(|h| progress.get(h.id).copied().unwrap_or(false))
}

/// Share of today's habits done, in percent
pub fn completion_rate(progress: &ProgressMap) -> f64 {
    let completed = DAILY_HABITS
        .iter()
        .filter(|h| progress.get(h.id).copied().unwrap_or(false))
        .count();
    completed as f64 * 100.0 / DAILY_HABITS.len() as f64
}

/// Days left until the end of the challenge
pub fn days_remaining(challenge: Option<&Challenge>) -> u32 {
    CHALLENGE_DURATION.saturating_sub(challenge.map(|c| c.current_day).unwrap_or(0))
}

/// Header label, e.g. "Day 3 of 40"
pub fn day_label(challenge: Option<&Challenge>) -> String {
    match challenge {
        Some(c) => format!("Day {} of {}", c.current_day.max(1), CHALLENGE_DURATION),
        None => "Ready to start your journey?".to_string(),
    }
}
