//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`UnhookSettings::default()`]
//! 2. If `~/.unhook/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `UNHOOK_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::{RateLimit, UnhookSettings};

/// Resolve the Unhook home directory (`~/.unhook`).
pub fn unhook_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".unhook")
}

/// Resolve the path to the settings file (`~/.unhook/settings.json`).
pub fn settings_path() -> PathBuf {
    unhook_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<UnhookSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON or a rate limit that admits
/// nothing is an error.
pub fn load_settings_from_path(path: &Path) -> Result<UnhookSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
fn load_file_layer(path: &Path) -> Result<UnhookSettings> {
    let parse_err = |source: serde_json::Error| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let defaults = serde_json::to_value(UnhookSettings::default()).map_err(parse_err)?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(parse_err)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    serde_json::from_value(merged).map_err(parse_err)
}

/// Reject rate limits that could never admit a request.
pub fn validate(settings: &UnhookSettings) -> Result<()> {
    let limits: [(&'static str, RateLimit); 3] = [
        ("postLimit", settings.safety.post_limit),
        ("replyLimit", settings.safety.reply_limit),
        ("messageLimit", settings.safety.message_limit),
    ];
    for (name, limit) in limits {
        if limit.max_requests == 0 || limit.window_ms == 0 {
            return Err(SettingsError::InvalidRateLimit { name });
        }
    }
    Ok(())
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (file/default value stays).
pub fn apply_env_overrides(settings: &mut UnhookSettings) {
    // ── Storage ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("UNHOOK_DATA_DIR") {
        settings.storage.data_dir = v;
    }

    // ── Safety ──────────────────────────────────────────────────────
    if let Some(v) = read_env_u32("UNHOOK_POST_LIMIT", 1, 10_000) {
        settings.safety.post_limit.max_requests = v;
    }
    if let Some(v) = read_env_u32("UNHOOK_REPLY_LIMIT", 1, 10_000) {
        settings.safety.reply_limit.max_requests = v;
    }
    if let Some(v) = read_env_u32("UNHOOK_MESSAGE_LIMIT", 1, 10_000) {
        settings.safety.message_limit.max_requests = v;
    }
    if let Some(v) = read_env_u64("UNHOOK_RATE_WINDOW_MS", 1000, 86_400_000) {
        for limit in [
            &mut settings.safety.post_limit,
            &mut settings.safety.reply_limit,
            &mut settings.safety.message_limit,
        ] {
            limit.window_ms = v;
        }
    }

    // ── Coach ───────────────────────────────────────────────────────
    if let Some(v) = read_env_string("UNHOOK_COACH_URL") {
        settings.coach.base_url = v;
    }
    if let Some(v) = read_env_string("UNHOOK_COACH_API_KEY") {
        settings.coach.api_key = Some(v);
    }
    if let Some(v) = read_env_u64("UNHOOK_COACH_TIMEOUT_MS", 1000, 600_000) {
        settings.coach.timeout_ms = v;
    }

    // ── Sync ────────────────────────────────────────────────────────
    if let Some(v) = read_env_bool("UNHOOK_SYNC_ENABLED") {
        settings.sync.enabled = v;
    }
    if let Some(v) = read_env_string("UNHOOK_SYNC_URL") {
        settings.sync.base_url = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("UNHOOK_LOG") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("UNHOOK_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (min..=max).contains(&n).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "safety": {"postLimit": {"maxRequests": 5, "windowMs": 60000}}
        });
        let source = serde_json::json!({
            "safety": {"postLimit": {"maxRequests": 2}}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["safety"]["postLimit"]["maxRequests"], 2);
        assert_eq!(merged["safety"]["postLimit"]["windowMs"], 60000);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── file layer ──────────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let settings = load_file_layer(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings.storage.snapshot_key, "habit-storage");
        assert_eq!(settings.safety.post_limit.max_requests, 5);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"safety": {"replyLimit": {"maxRequests": 3, "windowMs": 1000}, "extraBlockedTerms": ["spamword"]}}"#,
        )
        .unwrap();

        let settings = load_file_layer(&path).unwrap();
        assert_eq!(settings.safety.reply_limit.max_requests, 3);
        assert_eq!(settings.safety.reply_limit.window_ms, 1000);
        assert_eq!(settings.safety.post_limit.max_requests, 5);
        assert_eq!(settings.safety.extra_blocked_terms, vec!["spamword"]);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert_matches!(err, SettingsError::Parse { path: p, .. } if p == path);
    }

    #[test]
    fn zero_rate_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"safety": {"replyLimit": {"maxRequests": 0}}}"#).unwrap();

        let err = load_settings_from_path(&path).unwrap_err();
        assert_matches!(err, SettingsError::InvalidRateLimit { name: "replyLimit" });
    }

    #[test]
    fn unreadable_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file
        let err = load_file_layer(dir.path()).unwrap_err();
        assert_matches!(err, SettingsError::Read { .. });
        assert!(err.to_string().contains(&*dir.path().to_string_lossy()));
    }

    #[test]
    fn default_limits_are_valid() {
        assert!(validate(&UnhookSettings::default()).is_ok());
    }

    // ── parsing ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "Off"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u32_range("20", 1, 10_000), Some(20));
        assert_eq!(parse_u32_range("0", 1, 10_000), None);
        assert_eq!(parse_u64_range("500", 1000, 600_000), None);
        assert_eq!(parse_u64_range("abc", 1000, 600_000), None);
        assert_eq!(parse_u64_range("60000", 1000, 600_000), Some(60_000));
    }

    #[test]
    fn settings_path_is_under_unhook_home() {
        assert!(settings_path().ends_with(".unhook/settings.json"));
    }
}
