//! TOML-based configuration persistence for the game.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RpsGesture\config.toml`
//! - Linux:    `~/.config/rps-gesture/config.toml` (or `$XDG_CONFIG_HOME`)
//! - macOS:    `~/Library/Application Support/RpsGesture/config.toml`
//!
//! # Example file
//!
//! ```toml
//! [game]
//! countdown_ticks = 3
//! tick_interval_ms = 1000
//! mirror_preview = true
//! reveal_hold_ms = 2000
//!
//! [camera]
//! preferred_index = 1
//! internal_candidates = [0, 1]
//! external_candidates = [2, 3, 4, 5, 6, 7, 8, 9]
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! # Serde default values
//!
//! Every section and every field has a serde default, so an empty file, a
//! file written by an older version, or a file with a single override all
//! load.  A missing file loads as `AppConfig::default()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::play_round::RoundSettings;
use crate::application::select_camera::CameraCandidates;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Round timing and presentation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    /// Countdown ticks before capturing starts.
    #[serde(default = "default_countdown_ticks")]
    pub countdown_ticks: u32,
    /// Length of one countdown tick in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Show the preview as a mirror image.
    #[serde(default = "default_true")]
    pub mirror_preview: bool,
    /// How long the reveal line stays up before the result is shown.
    #[serde(default = "default_reveal_hold_ms")]
    pub reveal_hold_ms: u64,
}

/// Camera selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// Skip probing and use this device index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_index: Option<u32>,
    /// Indices probed first (built-in webcams).
    #[serde(default = "default_internal_candidates")]
    pub internal_candidates: Vec<u32>,
    /// Indices probed after the internal ones (USB webcams).
    #[serde(default = "default_external_candidates")]
    pub external_candidates: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_countdown_ticks() -> u32 {
    3
}
fn default_tick_interval_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}
fn default_reveal_hold_ms() -> u64 {
    2000
}
fn default_internal_candidates() -> Vec<u32> {
    CameraCandidates::default().internal
}
fn default_external_candidates() -> Vec<u32> {
    CameraCandidates::default().external
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_ticks: default_countdown_ticks(),
            tick_interval_ms: default_tick_interval_ms(),
            mirror_preview: default_true(),
            reveal_hold_ms: default_reveal_hold_ms(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            preferred_index: None,
            internal_candidates: default_internal_candidates(),
            external_candidates: default_external_candidates(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// ── Conversions into application types ───────────────────────────────────────

impl GameConfig {
    pub fn round_settings(&self) -> RoundSettings {
        RoundSettings {
            countdown_ticks: self.countdown_ticks,
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            mirror_preview: self.mirror_preview,
        }
    }

    pub fn reveal_hold(&self) -> Duration {
        Duration::from_millis(self.reveal_hold_ms)
    }
}

impl CameraConfig {
    pub fn candidates(&self) -> CameraCandidates {
        CameraCandidates {
            internal: self.internal_candidates.clone(),
            external: self.external_candidates.clone(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    let dir = platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(dir.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RpsGesture"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rps-gesture"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RpsGesture")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
