//! Habit state data model.
//!
//! Everything here is persisted as one camelCase JSON tree. Every struct is
//! `#[serde(default)]` so snapshots written by older versions, which lack
//! newer fields, still load.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use unhook_core::{ActivityId, ChatMessageId, JournalEntryId, StrategyId};

use crate::coping::default_strategies;
use crate::errors::ProfileError;
use crate::progression::Progression;

/// Habit being quit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    /// Cigarettes, vaping.
    Smoking,
    /// Drinking.
    Alcohol,
    /// Compulsive scrolling.
    SocialMedia,
    /// Sugar.
    Sugar,
    /// Pornography.
    Pornography,
    /// Gambling and betting.
    Gambling,
    /// Junk food.
    JunkFood,
    /// Nail biting.
    NailBiting,
    /// Anything else; needs a custom name.
    #[default]
    Other,
}

impl HabitKind {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Smoking => "smoking",
            Self::Alcohol => "alcohol",
            Self::SocialMedia => "social_media",
            Self::Sugar => "sugar",
            Self::Pornography => "pornography",
            Self::Gambling => "gambling",
            Self::JunkFood => "junk_food",
            Self::NailBiting => "nail_biting",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for HabitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's single active cessation target.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitProfile {
    /// Habit kind.
    pub kind: HabitKind,
    /// Free-text name, present iff `kind` is [`HabitKind::Other`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Start of the current attempt. Reset on relapse.
    pub started_at: DateTime<Utc>,
    /// Trigger tags picked during onboarding.
    pub triggers: Vec<String>,
    /// Longest streak reached on this profile.
    pub longest_streak: u32,
    /// Minutes per day committed to activities.
    pub daily_commitment_minutes: u32,
    /// Activities generated per batch.
    pub focus_task_count: u32,
    /// Estimated money spent on the habit per day.
    pub daily_cost: f64,
    /// Estimated minutes spent on the habit per day.
    pub daily_time_minutes: u32,
}

impl HabitProfile {
    /// Profile for `kind` with default commitments.
    pub fn new(kind: HabitKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Set the custom name.
    #[must_use]
    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    /// Check onboarding invariants.
    pub fn validate(&self) -> Result<(), ProfileError> {
        match (self.kind, self.custom_name.as_deref()) {
            (HabitKind::Other, name) if name.is_none_or(|n| n.trim().is_empty()) => {
                Err(ProfileError::MissingCustomName)
            }
            (HabitKind::Other, _) | (_, None) => Ok(()),
            (_, Some(_)) => Err(ProfileError::UnexpectedCustomName),
        }
    }

    /// Whole days since `started_at`.
    pub fn days_since_start(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_days().max(0)
    }
}

impl Default for HabitProfile {
    fn default() -> Self {
        Self {
            kind: HabitKind::default(),
            custom_name: None,
            started_at: DateTime::<Utc>::default(),
            triggers: Vec::new(),
            longest_streak: 0,
            daily_commitment_minutes: 15,
            focus_task_count: 3,
            daily_cost: 0.0,
            daily_time_minutes: 0,
        }
    }
}

/// Streak continuity record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreakState {
    /// Consecutive days checked in.
    pub current_streak: u32,
    /// Date of the last check-in, real or synthesized by a freeze.
    pub last_check_in: Option<NaiveDate>,
    /// Every date with a real check-in.
    pub check_in_history: BTreeSet<NaiveDate>,
    /// Relapses so far.
    pub relapse_count: u32,
    /// Check-ins in the current ISO week.
    pub weekly_check_ins: u32,
    /// Streak freezes in inventory.
    pub streak_freeze_count: u32,
    /// Date the last freeze was used.
    pub last_freeze_used: Option<NaiveDate>,
}

/// Where the streak stands relative to today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
    /// No active streak.
    Fresh,
    /// Today is covered.
    CheckedInToday,
    /// Yesterday was the last check-in; today is still open.
    AtRisk,
    /// A day was missed; the streak is due to be reset.
    Broken,
}

/// Daily activity category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Journaling or introspection.
    #[default]
    Reflection,
    /// Breathing exercise.
    Breathing,
    /// Reading or learning.
    Learning,
    /// Physical or practical task.
    Action,
}

/// One generated daily task.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyActivity {
    /// ID.
    pub id: ActivityId,
    /// Title.
    pub title: String,
    /// Category.
    pub kind: ActivityKind,
    /// Done today.
    pub completed: bool,
    /// Suggested time of day.
    pub time_label: String,
    /// Suggested duration.
    pub duration_label: String,
}

/// Journal mood tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Great.
    Great,
    /// Good.
    Good,
    /// Neutral.
    Neutral,
    /// Bad.
    Bad,
    /// Terrible.
    Terrible,
}

/// Private reflection record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JournalEntry {
    /// ID.
    pub id: JournalEntryId,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Sanitized, possibly redacted text.
    pub text: String,
    /// Written by the bot. Only set by old snapshots.
    pub is_bot: bool,
    /// Mood tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

/// One coach conversation turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatMessage {
    /// ID.
    pub id: ChatMessageId,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Text, or the premium sentinel.
    pub text: String,
    /// Written by the coach.
    pub is_bot: bool,
}

/// Catalog entry for a distraction technique.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CopingStrategy {
    /// ID.
    pub id: StrategyId,
    /// Title.
    pub title: String,
    /// Short description.
    pub description: String,
    /// Icon tag.
    pub icon: String,
    /// Suggested duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    /// In-app route; custom strategies have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
}

/// The persisted state tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HabitState {
    /// Onboarding finished.
    pub has_completed_onboarding: bool,
    /// Display name.
    pub display_name: String,
    /// Active profile.
    pub profile: Option<HabitProfile>,
    /// Streak record.
    pub streak: StreakState,
    /// XP and level.
    pub progression: Progression,
    /// Current activity batch.
    pub activities: Vec<DailyActivity>,
    /// Journal, newest first.
    pub journal: Vec<JournalEntry>,
    /// Coach conversation, oldest first.
    pub chat: Vec<ChatMessage>,
    /// Coping-strategy catalog.
    pub coping_strategies: Vec<CopingStrategy>,
    /// Milestone reached by the latest check-in, for the UI to celebrate.
    pub last_milestone: Option<u32>,
}

impl Default for HabitState {
    fn default() -> Self {
        Self {
            has_completed_onboarding: false,
            display_name: String::new(),
            profile: None,
            streak: StreakState::default(),
            progression: Progression::default(),
            activities: Vec::new(),
            journal: Vec::new(),
            chat: Vec::new(),
            coping_strategies: default_strategies(),
            last_milestone: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
