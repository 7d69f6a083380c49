//! # unhook-core
//!
//! Foundation types shared by every Unhook crate.
//!
//! - **Branded IDs**: `JournalEntryId`, `ChatMessageId`, `ActivityId`,
//!   `StrategyId` as newtypes for type safety
//! - **Clock**: [`clock::Clock`] abstraction so streak and rate-limit logic can
//!   be driven by a manual clock in tests
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` subscriber

#![deny(unsafe_code)]

pub mod clock;
pub mod ids;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{ActivityId, ChatMessageId, JournalEntryId, StrategyId};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
