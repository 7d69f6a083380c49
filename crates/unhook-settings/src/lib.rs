//! # unhook-settings
//!
//! Configuration for the Unhook core, loaded from three layers (in priority
//! order):
//! 1. **Compiled defaults**: [`UnhookSettings::default()`]
//! 2. **User file**: `~/.unhook/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `UNHOOK_*` overrides (highest priority)
//!
//! Settings are passed explicitly to the components that need them; there is
//! no global instance.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
    unhook_home, validate,
};
pub use types::*;

use std::path::PathBuf;

impl StorageSettings {
    /// Resolved data directory (`~/.unhook/data` when unset).
    pub fn data_dir_path(&self) -> PathBuf {
        if self.data_dir.is_empty() {
            unhook_home().join("data")
        } else {
            PathBuf::from(&self.data_dir)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
