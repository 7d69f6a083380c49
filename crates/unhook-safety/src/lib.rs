//! # unhook-safety
//!
//! Content-safety pipeline every user-generated write passes through.
//!
//! - [`sanitize`]: markup stripping and per-kind length/format validation
//! - [`filter`]: Turkish/English blocklist, leetspeak folding, threat
//!   detection and redaction
//! - [`rate_limit`]: fixed-window limiter for community actions
//! - [`gate`]: the three composed for posts, replies and direct messages
//!
//! Everything here is synchronous and deterministic; the rate limiter reads
//! time through an injected [`unhook_core::Clock`].

#![deny(unsafe_code)]

pub mod filter;
pub mod gate;
pub mod rate_limit;
pub mod sanitize;

pub use filter::{ContentFilter, FilterResult, REDACTION_MASK};
pub use gate::{ContentGate, GateRejection};
pub use rate_limit::{RateLimitedAction, RateLimiter};
pub use sanitize::{
    ContentKind, ValidationError, ValidationResult, sanitize_and_validate, sanitize_markup,
};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
