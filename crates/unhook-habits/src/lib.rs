//! # unhook-habits
//!
//! Habit-cessation state: profile, streak, XP progression, daily activities,
//! journal, coach chat and coping strategies, owned by one [`HabitStore`].
//!
//! The store is constructed explicitly and shared by `Arc`. Actions are
//! synchronous; the coach call is the only await on the action path, and it
//! runs with no lock held (see [`chat`]). Persistence ([`persist`]) and
//! profile mirroring ([`sync`]) are background tasks fed by the store's
//! watch channel.
//!
//! ```text
//! HabitStore ──watch──▶ spawn_persistence ──▶ SnapshotPersister ──▶ EncryptedStore
//!            └─watch──▶ spawn_profile_sync ──▶ ProfileMirror
//! ```

#![deny(unsafe_code)]

pub mod activities;
pub mod chat;
pub mod coping;
pub mod errors;
pub mod persist;
pub mod progression;
pub mod store;
pub mod sync;
pub mod types;

pub use chat::{
    ChatTurn, ChatTurnOutcome, FALLBACK_REPLY, PREMIUM_REQUIRED_SENTINEL, PendingChatTurn,
};
pub use errors::{JournalRejection, PersistError, ProfileError};
pub use persist::{
    FilePersister, SNAPSHOT_VERSION, SnapshotPersister, hydrate, spawn_persistence,
};
pub use progression::{MILESTONES, Progression, RELAPSE_XP_PENALTY, xp_required};
pub use store::{CheckInOutcome, HabitStore};
pub use sync::{connect_profile_sync, profile_snapshot, spawn_profile_sync};
pub use types::{
    ActivityKind, ChatMessage, CopingStrategy, DailyActivity, HabitKind, HabitProfile, HabitState,
    JournalEntry, Mood, StreakState, StreakStatus,
};

use unhook_settings::LoggingSettings;

/// Install the global `tracing` subscriber described by `settings`.
pub fn init_logging(settings: &LoggingSettings) {
    if settings.json {
        unhook_core::logging::init_json_subscriber(&settings.level);
    } else {
        unhook_core::logging::init_subscriber(&settings.level);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
