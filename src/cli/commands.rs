//! Command definitions for the countdown CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::validate_duration;

// ============================================================================
// CLI Structure
// ============================================================================

/// Countdown timer CLI
#[derive(Parser, Debug)]
#[command(
    name = "countdown",
    version,
    about = "一時停止できるカウントダウンタイマー",
    long_about = "ターミナル上で動作するシンプルなカウントダウンタイマー。\n\
                  フォアグラウンドで実行するか、デーモンに接続して操作します。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the daemon socket
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a countdown on the daemon
    Start(StartArgs),

    /// Pause or resume the daemon's countdown
    Toggle,

    /// Cancel the daemon's countdown
    Cancel,

    /// Show the daemon's countdown status
    Status,

    /// Run a countdown in the foreground
    Run(RunArgs),

    /// Run as daemon (background service)
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Duration as seconds, MM:SS or H:MM:SS (daemon default if omitted)
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<i64>,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Duration as seconds, MM:SS or H:MM:SS (config default if omitted)
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<i64>,

    /// Disable the completion sound
    #[arg(long)]
    pub no_sound: bool,
}

/// Arguments for the daemon command
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Disable the completion sound
    #[arg(long)]
    pub no_sound: bool,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses a duration given as plain seconds, `MM:SS` or `H:MM:SS`.
///
/// Minutes and seconds after the first field must be below 60.
pub fn parse_duration(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("時間を指定してください".to_string());
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return Err(format!("時間の形式が不正です: {}", s));
    }

    let mut total: i64 = 0;
    for (i, part) in parts.iter().enumerate() {
        let value: i64 = part
            .parse()
            .map_err(|_| format!("時間の形式が不正です: {}", s))?;
        if value < 0 || (i > 0 && value >= 60) {
            return Err(format!("時間の形式が不正です: {}", s));
        }
        total = total
            .checked_mul(60)
            .and_then(|t| t.checked_add(value))
            .ok_or_else(|| format!("時間が大きすぎます: {}", s))?;
    }

    validate_duration(total)?;
    Ok(total)
}

// ============================================================================
// Tests
// ============================================================================
