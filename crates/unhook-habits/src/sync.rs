//! Remote profile mirroring.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use unhook_remote::{HttpProfileMirror, ProfileMirror, ProfileSnapshot, SyncError};
use unhook_settings::SyncSettings;

use crate::store::HabitStore;
use crate::types::HabitState;

/// Public progress fields of `state`. `None` before onboarding.
pub fn profile_snapshot(state: &HabitState) -> Option<ProfileSnapshot> {
    if !state.has_completed_onboarding {
        return None;
    }
    let profile = state.profile.as_ref()?;
    Some(ProfileSnapshot {
        user_name: state.display_name.clone(),
        habit_type: profile.kind.as_str().to_string(),
        custom_habit_name: profile.custom_name.clone(),
        current_streak: state.streak.current_streak,
        longest_streak: profile.longest_streak,
        relapse_count: state.streak.relapse_count,
        xp: state.progression.xp,
        level: state.progression.level,
    })
}

/// Mirror the profile on every change until `store` is dropped.
///
/// Unchanged snapshots are skipped. A failed upsert is logged and retried
/// with the next change.
pub fn spawn_profile_sync(store: &HabitStore, mirror: Arc<dyn ProfileMirror>) -> JoinHandle<()> {
    let mut rx = store.subscribe();
    tokio::spawn(async move {
        let mut last: Option<ProfileSnapshot> = None;
        loop {
            let snapshot = profile_snapshot(&rx.borrow_and_update());
            if let Some(snapshot) = snapshot.filter(|s| last.as_ref() != Some(s)) {
                match mirror.upsert(&snapshot).await {
                    Ok(()) => {
                        debug!(streak = snapshot.current_streak, "profile mirrored");
                        last = Some(snapshot);
                    }
                    Err(e) => warn!(error = %e, "profile sync failed"),
                }
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        debug!("store dropped, profile sync stopped");
    })
}

/// Start HTTP profile mirroring when `settings` enable it.
pub fn connect_profile_sync(
    store: &HabitStore,
    settings: &SyncSettings,
    bearer: Option<String>,
) -> Result<Option<JoinHandle<()>>, SyncError> {
    if !settings.enabled {
        info!("profile sync disabled");
        return Ok(None);
    }
    let mirror = HttpProfileMirror::new(settings, bearer)?;
    debug!(url = mirror.url(), "profile sync enabled");
    Ok(Some(spawn_profile_sync(store, Arc::new(mirror))))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
