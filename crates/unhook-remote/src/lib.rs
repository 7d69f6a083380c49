//! # unhook-remote
//!
//! Remote collaborators of the habit store, modeled as async traits with
//! HTTP implementations:
//!
//! - [`CoachClient`] / [`HttpCoachClient`]: the AI coach chat endpoint
//! - [`ProfileMirror`] / [`HttpProfileMirror`]: best-effort public profile
//!   upserts

#![deny(unsafe_code)]

pub mod coach;
pub mod errors;
pub mod profile;

pub use coach::{CoachClient, CoachRequest, HttpCoachClient};
pub use errors::{CoachError, SyncError};
pub use profile::{HttpProfileMirror, ProfileMirror, ProfileSnapshot};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
