//! Fixed-window, per-key rate limiter.
//!
//! The first request for a key (or the first after its window expired) opens
//! a window of `window` length with count 1. Further requests inside the
//! window are allowed while the count is below the maximum; once the count
//! reaches the maximum, requests are denied without incrementing.
//!
//! The key map is bounded. When a new key arrives at capacity, expired
//! windows are swept first; if none expired, the window closest to expiry is
//! evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use unhook_core::Clock;
use unhook_settings::{RateLimit, SafetySettings};

/// Community actions subject to rate limiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitedAction {
    /// Creating a community post.
    CreatePost,
    /// Replying to a community post.
    CreateReply,
    /// Sending a direct message.
    SendMessage,
}

impl RateLimitedAction {
    /// Stable name used as the key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatePost => "create_post",
            Self::CreateReply => "create_reply",
            Self::SendMessage => "send_message",
        }
    }
}

impl fmt::Display for RateLimitedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug)]
struct Window {
    count: u32,
    expires_at: DateTime<Utc>,
}

/// Per-key fixed-window limiter.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, Window>>,
    max_keys: usize,
    post_limit: RateLimit,
    reply_limit: RateLimit,
    message_limit: RateLimit,
}

impl RateLimiter {
    /// Limiter with limits and key bound taken from `settings`.
    pub fn new(clock: Arc<dyn Clock>, settings: &SafetySettings) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
            max_keys: settings.max_tracked_keys.max(1),
            post_limit: settings.post_limit,
            reply_limit: settings.reply_limit,
            message_limit: settings.message_limit,
        }
    }

    /// Limiter with default limits.
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, &SafetySettings::default())
    }

    /// Override the key bound.
    #[must_use]
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys.max(1);
        self
    }

    /// Configured limit for `action`.
    pub fn limit_for(&self, action: RateLimitedAction) -> RateLimit {
        match action {
            RateLimitedAction::CreatePost => self.post_limit,
            RateLimitedAction::CreateReply => self.reply_limit,
            RateLimitedAction::SendMessage => self.message_limit,
        }
    }

    /// Record a request for `key` and report whether it is allowed.
    pub fn allow(&self, key: &str, max_requests: u32, window: Duration) -> bool {
        let now = self.clock.now();
        let mut windows = self.windows.lock();

        if let Some(entry) = windows.get_mut(key) {
            if now < entry.expires_at {
                if entry.count >= max_requests {
                    return false;
                }
                entry.count += 1;
                return true;
            }
            *entry = Window {
                count: 1,
                expires_at: expiry(now, window),
            };
            return max_requests > 0;
        }

        if windows.len() >= self.max_keys {
            evict(&mut windows, now);
        }
        let _ = windows.insert(
            key.to_owned(),
            Window {
                count: 1,
                expires_at: expiry(now, window),
            },
        );
        max_requests > 0
    }

    /// Check `actor` against the configured limit for `action`.
    pub fn check_action(&self, action: RateLimitedAction, actor: &str) -> bool {
        let limit = self.limit_for(action);
        let window = Duration::milliseconds(i64::try_from(limit.window_ms).unwrap_or(i64::MAX));
        let key = format!("{action}:{actor}");
        let allowed = self.allow(&key, limit.max_requests, window);
        if !allowed {
            info!(%action, actor, "rate limit exceeded");
        }
        allowed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().len()
    }

    /// Forget all windows.
    pub fn clear(&self) {
        self.windows.lock().clear();
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("tracked_keys", &self.tracked_keys())
            .field("max_keys", &self.max_keys)
            .finish_non_exhaustive()
    }
}

fn expiry(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Drop expired windows; if none expired, drop the one expiring soonest.
fn evict(windows: &mut HashMap<String, Window>, now: DateTime<Utc>) {
    let before = windows.len();
    windows.retain(|_, w| w.expires_at > now);
    if windows.len() < before {
        debug!(swept = before - windows.len(), "swept expired rate-limit windows");
        return;
    }

    let oldest = windows
        .iter()
        .min_by_key(|(_, w)| w.expires_at)
        .map(|(k, _)| k.clone());
    if let Some(key) = oldest {
        let _ = windows.remove(&key);
        debug!(%key, "evicted rate-limit window at capacity");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
