//! Habit Catalogue
//!
//! The fixed definitions every challenge is built on:
//! - `DAILY_HABITS`: the five habits checked off each day
//! - `ACHIEVEMENT_MILESTONES`: streak lengths that unlock badges
//! - `CHALLENGE_RULES`: the challenge manifesto shown to participants

use serde::Serialize;

/// Number of days in a challenge
pub const CHALLENGE_DURATION: u32 = 40;

/// Broad grouping of a habit
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HabitCategory {
    /// Prayer, meditation, scripture
    Spiritual,
    /// Exercise and movement
    Physical,
    /// Hydration and body care
    Health,
    /// Reflection and journaling
    Mental,
}

impl std::fmt::Display for HabitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HabitCategory::Spiritual => write!(f, "spiritual"),
            HabitCategory::Physical => write!(f, "physical"),
            HabitCategory::Health => write!(f, "health"),
            HabitCategory::Mental => write!(f, "mental"),
        }
    }
}

/// One of the daily habits
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Habit {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: HabitCategory,
}

/// The five habits, in display order
pub const DAILY_HABITS: [Habit; 5] = [
    Habit {
        id: "prayer",
        title: "Prayer/Meditation",
        description: "Complete your daily prayers or meditation session",
        icon: "🤲",
        category: HabitCategory::Spiritual,
    },
    Habit {
        id: "quran",
        title: "Quran/Scripture Reading",
        description: "Read and reflect on sacred texts",
        icon: "📖",
        category: HabitCategory::Spiritual,
    },
    Habit {
        id: "exercise",
        title: "Physical Exercise",
        description: "Engage in at least 30 minutes of physical activity",
        icon: "💪",
        category: HabitCategory::Physical,
    },
    Habit {
        id: "water",
        title: "Hydration",
        description: "Drink at least 8 glasses of water",
        icon: "💧",
        category: HabitCategory::Health,
    },
    Habit {
        id: "journal",
        title: "Daily Reflection",
        description: "Write in your journal and reflect on the day",
        icon: "✍️",
        category: HabitCategory::Mental,
    },
];

/// Look up a habit by id
pub fn find_habit(id: &str) -> Option<&'static Habit> {
    DAILY_HABITS.iter().find(|h| h.id == id)
}

/// Streak length that unlocks a badge
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Milestone {
    pub days: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub badge: &'static str,
}

/// Milestones in ascending order of `days`
pub const ACHIEVEMENT_MILESTONES: [Milestone; 6] = [
    Milestone {
        days: 1,
        title: "First Step",
        description: "You've begun your journey!",
        badge: "🌟",
    },
    Milestone {
        days: 7,
        title: "Week Warrior",
        description: "One week of consistency!",
        badge: "🔥",
    },
    Milestone {
        days: 14,
        title: "Fortnight Fighter",
        description: "Two weeks strong!",
        badge: "⚡",
    },
    Milestone {
        days: 21,
        title: "Habit Former",
        description: "They say it takes 21 days!",
        badge: "💎",
    },
    Milestone {
        days: 30,
        title: "Monthly Master",
        description: "A full month of dedication!",
        badge: "👑",
    },
    Milestone {
        days: 40,
        title: "Challenge Champion",
        description: "You've completed the full challenge!",
        badge: "🏆",
    },
];

/// The challenge manifesto (Markdown)
pub const CHALLENGE_RULES: &str = r#"# The AnsuryX Challenge Manifesto

## The Mission
Transform your life in 40 days through unwavering commitment to five fundamental pillars of human excellence.

## The Five Pillars
1. **Spiritual Connection** - Daily prayer/meditation
2. **Sacred Knowledge** - Quran/Scripture reading
3. **Physical Strength** - Exercise and movement
4. **Life Essence** - Proper hydration
5. **Mental Clarity** - Daily reflection and journaling

## The Rules
- Complete ALL five habits every single day
- Miss one day = Start over from Day 1
- No exceptions, no excuses
- Track your progress honestly
- Reflect and journal daily

## The Reward
- Unshakeable discipline
- Spiritual growth
- Physical vitality
- Mental clarity
- A transformed life

*"Excellence is not an act, but a habit. We are what we repeatedly do."*
"#;
