//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a partial
//! JSON file only needs the keys it overrides.

use serde::{Deserialize, Serialize};

/// Root settings type.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnhookSettings {
    /// Settings schema version.
    pub version: String,
    /// Local persistence.
    pub storage: StorageSettings,
    /// Content-safety pipeline.
    pub safety: SafetySettings,
    /// Remote AI coach endpoint.
    pub coach: CoachSettings,
    /// Remote profile mirror.
    pub sync: SyncSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Default for UnhookSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            storage: StorageSettings::default(),
            safety: SafetySettings::default(),
            coach: CoachSettings::default(),
            sync: SyncSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Local persistence settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Directory holding the key/value files. Empty means `~/.unhook/data`.
    pub data_dir: String,
    /// Storage key of the persisted state snapshot.
    pub snapshot_key: String,
    /// Secret-store alias of the device encryption key.
    pub key_alias: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            snapshot_key: "habit-storage".to_string(),
            key_alias: "unhook_encryption_key".to_string(),
        }
    }
}

/// One fixed-window limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Requests allowed per window.
    pub max_requests: u32,
    /// Window length in milliseconds.
    pub window_ms: u64,
}

/// Content-safety settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SafetySettings {
    /// Community post creation.
    pub post_limit: RateLimit,
    /// Community reply creation.
    pub reply_limit: RateLimit,
    /// Direct message sends.
    pub message_limit: RateLimit,
    /// Upper bound on distinct rate-limit keys held in memory.
    pub max_tracked_keys: usize,
    /// Additional blocked terms appended to the built-in list.
    pub extra_blocked_terms: Vec<String>,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            post_limit: RateLimit {
                max_requests: 5,
                window_ms: 60_000,
            },
            reply_limit: RateLimit {
                max_requests: 15,
                window_ms: 60_000,
            },
            message_limit: RateLimit {
                max_requests: 20,
                window_ms: 60_000,
            },
            max_tracked_keys: 10_000,
            extra_blocked_terms: Vec::new(),
        }
    }
}

/// Remote AI coach settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoachSettings {
    /// Base URL of the hosted functions service.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Bearer token sent with each request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for CoachSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321/functions/v1".to_string(),
            timeout_ms: 30_000,
            api_key: None,
        }
    }
}

/// Remote profile mirror settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Whether profile mirroring runs at all.
    pub enabled: bool,
    /// Base URL of the hosted REST service.
    pub base_url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:54321/rest/v1".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Filter directive passed to the subscriber.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
