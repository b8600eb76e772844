//! Countdown Timer Library
//!
//! This library provides the core functionality for the countdown CLI.
//! It includes:
//! - Timer engine with Idle/Running/Paused states driven by tick sources
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing, display utilities and the foreground countdown
//! - Type definitions for configuration and state
//! - Sound playback for the completion notice

pub mod cli;
pub mod daemon;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    CountdownConfig, IpcRequest, IpcResponse, ResponseData, StartParams, TimerSnapshot,
    TimerStatus,
};

// Re-export engine types
pub use daemon::{
    IntervalTickProvider, ManualTickProvider, TickOutcome, TickProvider, TickSignal, TickSource,
    TimerCommand, TimerEngine, TimerError, TimerEvent,
};

// Re-export sound types
pub use sound::{
    discover_system_sounds, get_default_sound, MockSoundPlayer, RodioSoundPlayer, SoundError,
    SoundPlayer, SoundSource, SoundWorker,
};
