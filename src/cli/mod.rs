//! CLI module for the countdown timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic
//! - `foreground`: Countdown run directly in the terminal

pub mod client;
pub mod commands;
pub mod display;
pub mod foreground;

pub use client::IpcClient;
pub use commands::{parse_duration, Cli, Commands, DaemonArgs, RunArgs, StartArgs};
pub use display::{format_countdown_line, render_progress_bar, Display};
pub use foreground::{run_foreground, ForegroundSession, InputAction, SessionOutcome};
