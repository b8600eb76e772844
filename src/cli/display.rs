//! Display utilities for the countdown CLI.
//!
//! This module provides formatted output for:
//! - Command feedback
//! - Error messages
//! - Status display
//! - The foreground countdown line

use std::io::Write;

use crate::daemon::TimerEvent;
use crate::types::{format_hms, progress_fraction, IpcResponse, ResponseData, TimerStatus};

/// Width of the progress bar in cells.
pub const PROGRESS_BAR_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a start command.
    pub fn show_start_success(response: &IpcResponse) {
        println!("> {}", response.message);
        Self::show_remaining(response.data.as_ref());
    }

    /// Shows the result of a toggle command.
    pub fn show_toggle_success(response: &IpcResponse) {
        let paused = response
            .data
            .as_ref()
            .and_then(|d| d.state.as_deref())
            == Some(TimerStatus::Paused.as_str());
        let marker = if paused { "||" } else { ">" };
        println!("{} {}", marker, response.message);
        Self::show_remaining(response.data.as_ref());
    }

    /// Shows the result of a cancel command.
    pub fn show_cancel_success(response: &IpcResponse) {
        println!("[] {}", response.message);
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        print!("{}", Self::format_status(response.data.as_ref()));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    fn show_remaining(data: Option<&ResponseData>) {
        if let Some(remaining) = data.and_then(|d| d.remaining_seconds) {
            println!("  残り時間: {}", format_hms(remaining));
        }
    }

    /// Builds the status block printed by `status`.
    pub fn format_status(data: Option<&ResponseData>) -> String {
        let mut out = String::new();
        out.push_str("カウントダウンタイマー ステータス\n");
        out.push_str("─────────────────────────────\n");

        let Some(data) = data else {
            out.push_str("タイマーは起動していません\n");
            return out;
        };

        let state = data.state.as_deref().unwrap_or("unknown");
        out.push_str(&format!("状態: {}\n", Self::state_label(state)));

        if state != TimerStatus::Idle.as_str() {
            let remaining = data.remaining_seconds.unwrap_or(0);
            let duration = data.duration_seconds.unwrap_or(0);
            out.push_str(&format!(
                "残り時間: {} / {}\n",
                format_hms(remaining),
                format_hms(duration)
            ));
            out.push_str(&format!(
                "{}\n",
                render_progress_bar(progress_fraction(remaining, duration), PROGRESS_BAR_WIDTH)
            ));
        }
        out
    }

    /// Maps a wire state name to its display label.
    pub fn state_label(state: &str) -> &str {
        match state {
            "idle" => "待機中",
            "running" => "実行中",
            "paused" => "一時停止中",
            _ => state,
        }
    }

    /// Renders a timer event for the foreground countdown.
    ///
    /// Returns `None` for events that produce no output.
    pub fn format_event(event: &TimerEvent, duration_seconds: i64) -> Option<String> {
        match event {
            TimerEvent::Started { duration_seconds } => Some(format_countdown_line(
                TimerStatus::Running,
                *duration_seconds,
                *duration_seconds,
            )),
            TimerEvent::Tick { remaining_seconds } => Some(format_countdown_line(
                TimerStatus::Running,
                *remaining_seconds,
                duration_seconds,
            )),
            TimerEvent::Paused { remaining_seconds } => Some(format_countdown_line(
                TimerStatus::Paused,
                *remaining_seconds,
                duration_seconds,
            )),
            TimerEvent::Resumed { remaining_seconds } => Some(format_countdown_line(
                TimerStatus::Running,
                *remaining_seconds,
                duration_seconds,
            )),
            TimerEvent::Cancelled | TimerEvent::Completed => None,
        }
    }

    /// Redraws the foreground countdown line in place.
    pub fn redraw_line(line: &str) {
        let mut stdout = std::io::stdout();
        let _ = write!(stdout, "\r\x1b[2K{}", line);
        let _ = stdout.flush();
    }

    /// Ends the in-place line and prints a final message.
    pub fn finish_line(message: &str) {
        println!();
        println!("{}", message);
    }
}

/// Renders a fixed-width bar for the remaining `fraction` in `0.0..=1.0`.
///
/// Values outside the range are clamped.
pub fn render_progress_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let filled = ((fraction * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        (fraction * 100.0).round() as u32
    )
}

/// Formats the single countdown line shown while running in the foreground.
pub fn format_countdown_line(
    status: TimerStatus,
    remaining_seconds: i64,
    duration_seconds: i64,
) -> String {
    let marker = match status {
        TimerStatus::Paused => "||",
        _ => "> ",
    };
    let suffix = if status == TimerStatus::Paused {
        "  (Enter: 再開 / c: キャンセル)"
    } else {
        "  (Enter: 一時停止 / c: キャンセル)"
    };
    format!(
        "{} {} {}{}",
        marker,
        format_hms(remaining_seconds),
        render_progress_bar(
            progress_fraction(remaining_seconds, duration_seconds),
            PROGRESS_BAR_WIDTH
        ),
        suffix
    )
}

// ============================================================================
// Tests
// ============================================================================
