//! Content gate for community writes.
//!
//! Posts, replies and direct messages are screened in a fixed order:
//! sanitize and validate, reject unsafe content, then consume a rate-limit
//! slot. Invalid or unsafe submissions do not count against the limit.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use unhook_core::Clock;
use unhook_settings::SafetySettings;

use crate::filter::ContentFilter;
use crate::rate_limit::{RateLimitedAction, RateLimiter};
use crate::sanitize::{ContentKind, ValidationError, sanitize_and_validate};

/// Why a community write was refused.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum GateRejection {
    /// Failed sanitization or length/format validation.
    #[error("invalid content: {0}")]
    Invalid(ValidationError),
    /// Blocked terms or threat phrasing.
    #[error("content rejected by safety filter")]
    Unsafe {
        /// Blocked terms found.
        flagged_terms: Vec<String>,
        /// A threat pattern matched.
        has_threat: bool,
    },
    /// Too many requests in the current window.
    #[error("rate limit exceeded for {action}")]
    RateLimited {
        /// Limited action.
        action: RateLimitedAction,
    },
}

/// Sanitizer, filter and rate limiter composed for community writes.
#[derive(Debug)]
pub struct ContentGate {
    filter: Arc<ContentFilter>,
    limiter: RateLimiter,
}

impl ContentGate {
    /// Build a gate from existing parts.
    pub fn new(filter: Arc<ContentFilter>, limiter: RateLimiter) -> Self {
        Self { filter, limiter }
    }

    /// Build a gate from settings, including configured extra blocked terms.
    pub fn from_settings(clock: Arc<dyn Clock>, settings: &SafetySettings) -> Self {
        let filter = if settings.extra_blocked_terms.is_empty() {
            ContentFilter::shared()
        } else {
            Arc::new(ContentFilter::new().with_extra_terms(&settings.extra_blocked_terms))
        };
        Self::new(filter, RateLimiter::new(clock, settings))
    }

    /// The gate's filter.
    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    /// The gate's rate limiter.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Screen `raw` from `actor` for `action`; returns the sanitized text.
    pub fn screen(
        &self,
        action: RateLimitedAction,
        actor: &str,
        raw: &str,
    ) -> Result<String, GateRejection> {
        let sanitized = sanitize_and_validate(content_kind(action), raw)
            .into_result()
            .map_err(|err| {
                info!(%action, actor, error = %err, "content failed validation");
                GateRejection::Invalid(err)
            })?;

        let verdict = self.filter.filter(&sanitized);
        if !verdict.is_safe {
            info!(
                %action,
                actor,
                flagged = verdict.flagged_terms.len(),
                has_threat = verdict.has_threat,
                "content rejected by safety filter"
            );
            return Err(GateRejection::Unsafe {
                flagged_terms: verdict.flagged_terms,
                has_threat: verdict.has_threat,
            });
        }

        if !self.limiter.check_action(action, actor) {
            return Err(GateRejection::RateLimited { action });
        }

        Ok(sanitized)
    }
}

fn content_kind(action: RateLimitedAction) -> ContentKind {
    match action {
        RateLimitedAction::CreatePost => ContentKind::Post,
        RateLimitedAction::CreateReply => ContentKind::Reply,
        RateLimitedAction::SendMessage => ContentKind::Message,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, NaiveDate};
    use unhook_core::ManualClock;
    use unhook_settings::RateLimit;

    fn gate_with(settings: &SafetySettings) -> (Arc<ManualClock>, ContentGate) {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let clock = Arc::new(ManualClock::at_date(date));
        let gate = ContentGate::from_settings(clock.clone(), settings);
        (clock, gate)
    }

    #[test]
    fn clean_post_is_accepted_and_sanitized() {
        let (_clock, gate) = gate_with(&SafetySettings::default());
        let text = gate
            .screen(RateLimitedAction::CreatePost, "u1", "<b>Day 30!</b> smoke free")
            .unwrap();
        assert_eq!(text, "Day 30! smoke free");
    }

    #[test]
    fn short_post_is_invalid() {
        let (_clock, gate) = gate_with(&SafetySettings::default());
        let err = gate.screen(RateLimitedAction::CreatePost, "u1", "ok").unwrap_err();
        assert_eq!(err, GateRejection::Invalid(ValidationError::TooShort { min: 3 }));
    }

    #[test]
    fn unsafe_reply_is_rejected() {
        let (_clock, gate) = gate_with(&SafetySettings::default());
        let err = gate
            .screen(RateLimitedAction::CreateReply, "u1", "sen tam bir salaksın")
            .unwrap_err();
        assert_matches!(err, GateRejection::Unsafe { flagged_terms, has_threat: false } => {
            assert_eq!(flagged_terms, vec!["salak"]);
        });
    }

    #[test]
    fn threat_message_is_rejected() {
        let (_clock, gate) = gate_with(&SafetySettings::default());
        let err = gate
            .screen(RateLimitedAction::SendMessage, "u1", "I will find you")
            .unwrap_err();
        assert_matches!(err, GateRejection::Unsafe { has_threat: true, .. });
    }

    #[test]
    fn rejected_content_does_not_consume_quota() {
        let settings = SafetySettings {
            post_limit: RateLimit {
                max_requests: 1,
                window_ms: 60_000,
            },
            ..SafetySettings::default()
        };
        let (_clock, gate) = gate_with(&settings);
        assert!(gate.screen(RateLimitedAction::CreatePost, "u1", "aptal").is_err());
        assert!(gate.screen(RateLimitedAction::CreatePost, "u1", "").is_err());
        assert!(gate.screen(RateLimitedAction::CreatePost, "u1", "first post").is_ok());
    }

    #[test]
    fn rate_limit_applies_after_filtering() {
        let settings = SafetySettings {
            message_limit: RateLimit {
                max_requests: 2,
                window_ms: 60_000,
            },
            ..SafetySettings::default()
        };
        let (clock, gate) = gate_with(&settings);
        assert!(gate.screen(RateLimitedAction::SendMessage, "u1", "hi").is_ok());
        assert!(gate.screen(RateLimitedAction::SendMessage, "u1", "hello").is_ok());
        assert_eq!(
            gate.screen(RateLimitedAction::SendMessage, "u1", "again"),
            Err(GateRejection::RateLimited {
                action: RateLimitedAction::SendMessage
            })
        );
        // Other actors unaffected
        assert!(gate.screen(RateLimitedAction::SendMessage, "u2", "hi").is_ok());

        clock.advance(Duration::minutes(1));
        assert!(gate.screen(RateLimitedAction::SendMessage, "u1", "back").is_ok());
    }

    #[test]
    fn extra_terms_from_settings() {
        let settings = SafetySettings {
            extra_blocked_terms: vec!["spamword".to_string()],
            ..SafetySettings::default()
        };
        let (_clock, gate) = gate_with(&settings);
        assert_matches!(
            gate.screen(RateLimitedAction::CreatePost, "u1", "buy SPAMWORD now"),
            Err(GateRejection::Unsafe { .. })
        );
    }

    #[test]
    fn rejection_display() {
        let err = GateRejection::RateLimited {
            action: RateLimitedAction::CreateReply,
        };
        assert_eq!(err.to_string(), "rate limit exceeded for create_reply");
        let err = GateRejection::Invalid(ValidationError::Empty);
        assert_eq!(err.to_string(), "invalid content: content cannot be empty");
    }

    #[test]
    fn rejection_wire_shapes() {
        let invalid = GateRejection::Invalid(ValidationError::TooLong { max: 500 });
        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "invalid", "reason": "too_long", "max": 500})
        );
        let back: GateRejection = serde_json::from_value(json).unwrap();
        assert_eq!(back, invalid);

        let unsafe_content = GateRejection::Unsafe {
            flagged_terms: vec!["aptal".into()],
            has_threat: false,
        };
        assert_eq!(
            serde_json::to_value(&unsafe_content).unwrap(),
            serde_json::json!({"kind": "unsafe", "flagged_terms": ["aptal"], "has_threat": false})
        );

        let limited = GateRejection::RateLimited {
            action: RateLimitedAction::CreatePost,
        };
        let json = serde_json::to_value(&limited).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "rate_limited", "action": "create_post"})
        );
        assert_eq!(serde_json::from_value::<GateRejection>(json).unwrap(), limited);
    }
}
