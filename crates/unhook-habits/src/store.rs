//! The habit state store.
//!
//! [`HabitStore`] is the only mutator of [`HabitState`]. Actions run
//! synchronously under a short mutex critical section and publish the new
//! state as an `Arc<HabitState>` on a watch channel; persistence and profile
//! sync subscribe to that channel instead of being called from the actions.
//!
//! Continuity is keyed by calendar date from the injected [`Clock`]. A streak
//! survives as long as the last check-in (real, or synthesized by a streak
//! freeze) is today or yesterday; [`HabitStore::reconcile_missed_days`]
//! zeroes it otherwise.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, NaiveDate};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};
use unhook_core::{ActivityId, Clock, JournalEntryId, StrategyId};
use unhook_safety::{
    ContentFilter, ContentKind, ValidationError, sanitize_and_validate, sanitize_markup,
};

use crate::activities;
use crate::coping::default_strategies;
use crate::errors::{JournalRejection, ProfileError};
use crate::progression::{RELAPSE_XP_PENALTY, milestone_for};
use crate::types::{CopingStrategy, HabitProfile, HabitState, JournalEntry, Mood, StreakStatus};

/// Result of [`HabitStore::check_in`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CheckInOutcome {
    /// Today already has a check-in; nothing changed.
    AlreadyCheckedIn,
    /// Check-in recorded.
    CheckedIn {
        /// Streak after the check-in.
        streak: u32,
        /// Levels gained from the XP.
        levels_gained: u32,
        /// Milestone reached, if any.
        milestone: Option<u32>,
    },
}

pub(crate) struct Inner {
    pub(crate) state: HabitState,
    rng: StdRng,
}

/// Injectable habit state container.
pub struct HabitStore {
    clock: Arc<dyn Clock>,
    filter: Arc<ContentFilter>,
    inner: Mutex<Inner>,
    hydrated: AtomicBool,
    tx: watch::Sender<Arc<HabitState>>,
}

impl HabitStore {
    /// Store with fresh-install state. `seed` drives activity selection.
    pub fn new(clock: Arc<dyn Clock>, filter: Arc<ContentFilter>, seed: u64) -> Self {
        Self::with_state(clock, filter, seed, HabitState::default())
    }

    /// Store starting from `state`.
    pub fn with_state(
        clock: Arc<dyn Clock>,
        filter: Arc<ContentFilter>,
        seed: u64,
        state: HabitState,
    ) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(state.clone()));
        Self {
            clock,
            filter,
            inner: Mutex::new(Inner {
                state,
                rng: StdRng::seed_from_u64(seed),
            }),
            hydrated: AtomicBool::new(false),
            tx,
        }
    }

    /// The injected clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Latest published state.
    pub fn snapshot(&self) -> Arc<HabitState> {
        self.tx.borrow().clone()
    }

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<HabitState>> {
        self.tx.subscribe()
    }

    /// Mark persisted state as loaded.
    pub fn mark_hydrated(&self) {
        self.hydrated.store(true, Ordering::Release);
    }

    /// Whether persisted state has been loaded.
    pub fn is_hydrated(&self) -> bool {
        self.hydrated.load(Ordering::Acquire)
    }

    /// Run `f` under the lock; publish when it reports a change.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Inner) -> (R, bool)) -> R {
        let mut inner = self.inner.lock();
        let (result, changed) = f(&mut inner);
        if changed {
            let _ = self.tx.send_replace(Arc::new(inner.state.clone()));
        }
        result
    }

    /// Replace the whole state, e.g. after loading a snapshot.
    pub fn replace_state(&self, mut state: HabitState) {
        state.progression.normalize();
        self.update(|inner| {
            inner.state = state;
            ((), true)
        });
    }

    pub(crate) fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    // ── Onboarding ──────────────────────────────────────────────────

    /// Start a new journey with `profile`. Clears the journal, chat and the
    /// running streak. Freeze inventory, relapse count and XP carry over.
    pub fn complete_onboarding(
        &self,
        mut profile: HabitProfile,
        display_name: &str,
    ) -> Result<(), ProfileError> {
        profile.validate()?;
        let display_name = self
            .clean_display_name(display_name)
            .map_err(ProfileError::InvalidDisplayName)?;

        profile.started_at = self.clock.now();
        profile.longest_streak = 0;
        if let Some(name) = profile.custom_name.take() {
            let name = self
                .clean_free_text(ContentKind::Title, &name)
                .map_err(ProfileError::InvalidCustomName)?;
            profile.custom_name = Some(name);
        }

        self.update(|inner| {
            let activities = activities::generate(Some(&profile), &mut inner.rng);
            let state = &mut inner.state;
            state.profile = Some(profile);
            state.display_name = display_name;
            state.streak.current_streak = 0;
            state.streak.last_check_in = None;
            state.journal.clear();
            state.chat.clear();
            state.activities = activities;
            state.last_milestone = None;
            state.has_completed_onboarding = true;
            debug!(activities = state.activities.len(), "onboarding completed");
            ((), true)
        });
        Ok(())
    }

    /// Change the display name.
    pub fn set_display_name(&self, name: &str) -> Result<(), ValidationError> {
        let name = self.clean_display_name(name)?;
        self.update(|inner| {
            let changed = inner.state.display_name != name;
            inner.state.display_name = name;
            ((), changed)
        });
        Ok(())
    }

    fn clean_display_name(&self, raw: &str) -> Result<String, ValidationError> {
        self.clean_free_text(ContentKind::DisplayName, raw)
    }

    /// Sanitize and validate `raw` as `kind`, then redact unsafe terms.
    fn clean_free_text(&self, kind: ContentKind, raw: &str) -> Result<String, ValidationError> {
        let text = sanitize_and_validate(kind, raw).into_result()?;
        Ok(self.filter.filter(&text).safe_text(&text))
    }

    // ── Streak ──────────────────────────────────────────────────────

    /// Record today's check-in and award `xp_gained`.
    pub fn check_in(&self, xp_gained: u32) -> CheckInOutcome {
        let today = self.clock.today();
        self.update(|inner| {
            let state = &mut inner.state;
            let streak = &mut state.streak;
            if streak.check_in_history.contains(&today) {
                return (CheckInOutcome::AlreadyCheckedIn, false);
            }

            let same_week = streak
                .check_in_history
                .last()
                .is_some_and(|last| last.iso_week() == today.iso_week());
            if !same_week {
                streak.weekly_check_ins = 0;
            }

            streak.current_streak += 1;
            streak.weekly_check_ins += 1;
            let _ = streak.check_in_history.insert(today);
            streak.last_check_in = Some(today);
            let current = streak.current_streak;

            if let Some(profile) = state.profile.as_mut() {
                profile.longest_streak = profile.longest_streak.max(current);
            }

            let levels_gained = state.progression.gain(xp_gained);
            let milestone = milestone_for(current);
            state.last_milestone = milestone;

            debug!(streak = current, xp_gained, levels_gained, ?milestone, "checked in");
            (
                CheckInOutcome::CheckedIn {
                    streak: current,
                    levels_gained,
                    milestone,
                },
                true,
            )
        })
    }

    /// Record a relapse: streak to zero, XP penalty, fresh start.
    pub fn relapse(&self) {
        let now = self.clock.now();
        self.update(|inner| {
            let activities = activities::generate(inner.state.profile.as_ref(), &mut inner.rng);
            let state = &mut inner.state;
            state.streak.current_streak = 0;
            state.streak.relapse_count += 1;
            state.progression.penalize(RELAPSE_XP_PENALTY);
            if let Some(profile) = state.profile.as_mut() {
                profile.started_at = now;
            }
            state.activities = activities;
            state.last_milestone = None;
            info!(relapses = state.streak.relapse_count, "relapse recorded");
            ((), true)
        });
    }

    /// Spend one freeze to cover today. Returns `false` with an empty
    /// inventory.
    pub fn use_streak_freeze(&self) -> bool {
        let today = self.clock.today();
        self.update(|inner| {
            let streak = &mut inner.state.streak;
            if streak.streak_freeze_count == 0 {
                return (false, false);
            }
            streak.streak_freeze_count -= 1;
            streak.last_freeze_used = Some(today);
            streak.last_check_in = Some(today);
            debug!(remaining = streak.streak_freeze_count, "streak freeze used");
            (true, true)
        })
    }

    /// Add one freeze to the inventory.
    pub fn add_streak_freeze(&self) {
        self.update(|inner| {
            let streak = &mut inner.state.streak;
            streak.streak_freeze_count = streak.streak_freeze_count.saturating_add(1);
            ((), true)
        });
    }

    /// Zero the streak when the last check-in is older than yesterday.
    /// Returns whether the streak was reset.
    pub fn reconcile_missed_days(&self) -> bool {
        let today = self.clock.today();
        self.update(|inner| {
            let streak = &mut inner.state.streak;
            if streak.current_streak == 0 || !is_missed(streak.last_check_in, today) {
                return (false, false);
            }
            info!(
                lost_streak = streak.current_streak,
                last_check_in = ?streak.last_check_in,
                "missed day, streak reset"
            );
            streak.current_streak = 0;
            inner.state.last_milestone = None;
            (true, true)
        })
    }

    /// Where the streak stands today.
    pub fn streak_status(&self) -> StreakStatus {
        let today = self.clock.today();
        let state = self.snapshot();
        let streak = &state.streak;
        if streak.last_check_in == Some(today) {
            StreakStatus::CheckedInToday
        } else if streak.current_streak == 0 {
            StreakStatus::Fresh
        } else if is_missed(streak.last_check_in, today) {
            StreakStatus::Broken
        } else {
            StreakStatus::AtRisk
        }
    }

    /// Clear the milestone marker once the UI has reacted to it.
    pub fn dismiss_milestone(&self) {
        self.update(|inner| {
            let changed = inner.state.last_milestone.take().is_some();
            ((), changed)
        });
    }

    // ── Activities ──────────────────────────────────────────────────

    /// Complete activity `id` and award `xp_gained`. Returns `false` when
    /// the activity is absent or already completed.
    pub fn complete_activity(&self, id: &ActivityId, xp_gained: u32) -> bool {
        self.update(|inner| {
            let state = &mut inner.state;
            let Some(activity) = state
                .activities
                .iter_mut()
                .find(|a| &a.id == id && !a.completed)
            else {
                return (false, false);
            };
            activity.completed = true;
            let levels = state.progression.gain(xp_gained);
            debug!(%id, xp_gained, levels, "activity completed");
            (true, true)
        })
    }

    // ── Journal ─────────────────────────────────────────────────────

    /// Add a journal entry. Invalid text is dropped and reported; unsafe
    /// text is stored redacted.
    pub fn add_journal_entry(
        &self,
        text: &str,
        mood: Option<Mood>,
    ) -> Result<JournalEntryId, JournalRejection> {
        let sanitized = sanitize_and_validate(ContentKind::Journal, text)
            .into_result()
            .map_err(|err| {
                debug!(error = %err, "journal entry dropped");
                JournalRejection(err)
            })?;
        let text = self.filter.filter(&sanitized).safe_text(&sanitized);

        let entry = JournalEntry {
            id: JournalEntryId::new(),
            timestamp: self.clock.now(),
            text,
            is_bot: false,
            mood,
        };
        let id = entry.id.clone();
        self.update(|inner| {
            inner.state.journal.insert(0, entry);
            ((), true)
        });
        Ok(id)
    }

    /// Delete journal entry `id`. Returns `false` when absent.
    pub fn delete_journal_entry(&self, id: &JournalEntryId) -> bool {
        self.update(|inner| {
            let before = inner.state.journal.len();
            inner.state.journal.retain(|e| &e.id != id);
            let removed = inner.state.journal.len() != before;
            (removed, removed)
        })
    }

    // ── Coping strategies ───────────────────────────────────────────

    /// Add a custom strategy. Custom strategies have no route.
    pub fn add_coping_strategy(
        &self,
        title: &str,
        description: &str,
        icon: &str,
        duration_minutes: Option<u32>,
    ) -> Result<StrategyId, ValidationError> {
        let title = self.clean_free_text(ContentKind::Title, title)?;
        let description = if sanitize_markup(description).is_empty() {
            String::new()
        } else {
            self.clean_free_text(ContentKind::Message, description)?
        };
        let strategy = CopingStrategy {
            id: StrategyId::new(),
            title,
            description,
            icon: icon.trim().to_string(),
            duration_minutes,
            route: None,
        };
        let id = strategy.id.clone();
        self.update(|inner| {
            inner.state.coping_strategies.push(strategy);
            ((), true)
        });
        Ok(id)
    }

    /// Remove strategy `id`. Returns `false` when absent.
    pub fn remove_coping_strategy(&self, id: &StrategyId) -> bool {
        self.update(|inner| {
            let before = inner.state.coping_strategies.len();
            inner.state.coping_strategies.retain(|s| &s.id != id);
            let removed = inner.state.coping_strategies.len() != before;
            (removed, removed)
        })
    }

    /// Replace the catalog with the defaults, dropping custom entries.
    pub fn restore_default_strategies(&self) {
        self.update(|inner| {
            inner.state.coping_strategies = default_strategies();
            ((), true)
        });
    }

    // ── Reset ───────────────────────────────────────────────────────

    /// Back to fresh-install state. The auth session is not touched.
    pub fn reset_app(&self) {
        self.update(|inner| {
            inner.state = HabitState::default();
            info!("app state reset");
            ((), true)
        });
    }
}

impl std::fmt::Debug for HabitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HabitStore")
            .field("hydrated", &self.is_hydrated())
            .finish_non_exhaustive()
    }
}

/// Last check-in before yesterday (or never).
fn is_missed(last_check_in: Option<NaiveDate>, today: NaiveDate) -> bool {
    match (last_check_in, today.pred_opt()) {
        (Some(last), Some(yesterday)) => last < yesterday,
        (None, _) => true,
        (Some(_), None) => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
