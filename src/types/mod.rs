//! Core data types for the countdown timer.
//!
//! This module defines the data structures used for:
//! - Timer status and snapshots
//! - Configuration with validation and file loading
//! - IPC request/response serialization

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Directory under the home directory holding config and socket.
pub const APP_DIR_NAME: &str = ".countdown";

/// Config file name inside [`APP_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Socket file name inside [`APP_DIR_NAME`].
pub const SOCKET_FILE_NAME: &str = "countdown.sock";

/// Longest countdown accepted from user input (24 hours).
pub const MAX_DURATION_SECONDS: i64 = 24 * 60 * 60;

// ============================================================================
// TimerStatus
// ============================================================================

/// Represents the current state of the timer engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// No countdown in progress
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Countdown suspended
    Paused,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }

    /// Returns true if a countdown is in progress (running or paused).
    pub fn is_active(&self) -> bool {
        matches!(self, TimerStatus::Running | TimerStatus::Paused)
    }
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    /// Current status
    pub status: TimerStatus,
    /// Configured countdown length in seconds
    pub duration_seconds: i64,
    /// Seconds left in the countdown
    pub remaining_seconds: i64,
}

impl TimerSnapshot {
    /// Returns the fraction of the countdown still remaining, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        progress_fraction(self.remaining_seconds, self.duration_seconds)
    }
}

/// Computes `remaining / duration`, clamped to `[0, 1]`.
///
/// Returns 0 when the duration is not positive.
pub fn progress_fraction(remaining_seconds: i64, duration_seconds: i64) -> f64 {
    if duration_seconds <= 0 {
        return 0.0;
    }
    (remaining_seconds as f64 / duration_seconds as f64).clamp(0.0, 1.0)
}

/// Formats seconds as `HH:MM:SS`. Negative values render as `00:00:00`.
pub fn format_hms(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

// ============================================================================
// CountdownConfig
// ============================================================================

fn default_duration_seconds() -> i64 {
    60
}

fn default_tick_interval_millis() -> u64 {
    1000
}

fn default_sound_enabled() -> bool {
    true
}

/// Completion sound settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// Whether to play a sound when the countdown completes
    #[serde(default = "default_sound_enabled")]
    pub enabled: bool,
    /// Preferred system sound name (e.g. "Glass"); `None` picks a default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: default_sound_enabled(),
            name: None,
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("設定ファイルを読み込めません: {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for [`CountdownConfig`].
    #[error("設定ファイルの形式が不正です: {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value is out of range.
    #[error("{0}")]
    Invalid(String),

    /// The home directory could not be determined.
    #[error("ホームディレクトリを特定できません")]
    NoHomeDir,
}

/// Configuration for the countdown timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownConfig {
    /// Countdown length used when none is given, in seconds
    #[serde(default = "default_duration_seconds")]
    pub default_duration_seconds: i64,
    /// Interval between ticks in milliseconds
    #[serde(default = "default_tick_interval_millis")]
    pub tick_interval_millis: u64,
    /// Completion sound settings
    #[serde(default)]
    pub sound: SoundConfig,
    /// Daemon socket path; defaults to `~/.countdown/countdown.sock`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            default_duration_seconds: default_duration_seconds(),
            tick_interval_millis: default_tick_interval_millis(),
            sound: SoundConfig::default(),
            socket_path: None,
        }
    }
}

impl CountdownConfig {
    /// Returns `~/.countdown/config.json`, if the home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration from `path`.
    ///
    /// A missing file yields the defaults. The loaded values are validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file at {:?}, using defaults", path);
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Loads from the given path, or from [`default_path`](Self::default_path).
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Returns a copy with the given default duration.
    pub fn with_default_duration(mut self, seconds: i64) -> Self {
        self.default_duration_seconds = seconds;
        self
    }

    /// Returns a copy with the given tick interval.
    pub fn with_tick_interval_millis(mut self, millis: u64) -> Self {
        self.tick_interval_millis = millis;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_duration(self.default_duration_seconds).map_err(ConfigError::Invalid)?;
        if self.tick_interval_millis == 0 {
            return Err(ConfigError::Invalid(
                "ティック間隔は1ミリ秒以上で指定してください".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_millis)
    }

    /// Returns the configured socket path or the default one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if no path is configured and the
    /// home directory is unknown.
    pub fn resolve_socket_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => default_socket_path().ok_or(ConfigError::NoHomeDir),
        }
    }
}

/// Returns `~/.countdown/countdown.sock`, if the home directory is known.
pub fn default_socket_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DIR_NAME).join(SOCKET_FILE_NAME))
}

/// Checks that a user-supplied duration is within `1..=MAX_DURATION_SECONDS`.
///
/// # Errors
///
/// Returns a human-readable message if the duration is out of range.
pub fn validate_duration(seconds: i64) -> Result<(), String> {
    if !(1..=MAX_DURATION_SECONDS).contains(&seconds) {
        return Err(format!(
            "時間は1秒から{}秒の範囲で指定してください",
            MAX_DURATION_SECONDS
        ));
    }
    Ok(())
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the start command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartParams {
    /// Countdown length in seconds; daemon default when absent
    #[serde(rename = "durationSeconds", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a new countdown
    Start {
        /// Start parameters
        #[serde(flatten)]
        params: StartParams,
    },
    /// Pause a running countdown or resume a paused one
    Toggle,
    /// Cancel the countdown
    Cancel,
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Countdown length
    #[serde(rename = "durationSeconds", skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
}

impl ResponseData {
    /// Creates response data from an engine snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.status.as_str().to_string()),
            duration_seconds: Some(snapshot.duration_seconds),
            remaining_seconds: Some(snapshot.remaining_seconds),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
