//! Centralized directory paths for WTT.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/wtt/` | `~/.local/share/wtt/` |
//! | Config | `~/Library/Application Support/wtt/` | `~/.config/wtt/` |
//!
//! # Environment Overrides
//!
//! - `WTT_DATA_DIR`: overrides [`data_dir`]
//! - `WTT_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the research artifact database. Resolves to
/// `dirs::data_dir()/wtt/` unless `WTT_DATA_DIR` is set.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("WTT_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("wtt"))
        .unwrap_or_else(|| PathBuf::from("/tmp/wtt-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/wtt/` unless `WTT_CONFIG_DIR` is set.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("WTT_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("wtt"))
        .unwrap_or_else(|| PathBuf::from("/tmp/wtt-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default research database path (`data_dir()/research.db`).
#[must_use]
pub fn database_file() -> PathBuf {
    data_dir().join("research.db")
}
