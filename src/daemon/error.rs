//! Timer engine error types.

use thiserror::Error;

use crate::types::TimerStatus;

/// Commands accepted by the timer engine, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Toggle,
    Cancel,
}

impl TimerCommand {
    /// Returns the command name as used on the IPC wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerCommand::Start => "start",
            TimerCommand::Toggle => "toggle",
            TimerCommand::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for TimerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned synchronously by [`TimerEngine`](super::TimerEngine) commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    /// The requested duration was zero or negative.
    #[error("時間は1秒以上で指定してください (指定値: {0})")]
    InvalidDuration(i64),

    /// The command is not valid in the current state.
    #[error("{state}状態では{command}を実行できません")]
    InvalidTransition {
        /// State the engine was in when the command arrived
        state: TimerStatus,
        /// Rejected command
        command: TimerCommand,
    },

    /// The tick source provider could not create a source.
    #[error("ティックソースを作成できません: {0}")]
    TickSource(String),
}
