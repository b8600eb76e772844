//! Daemon module for the countdown timer.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Countdown state machine and its events
//! - `ticker`: Tick sources that drive the state machine
//! - `notifier`: Event consumer (logging and completion sound)
//! - `ipc`: Unix socket server and request dispatch
//! - `runner`: Wiring for the daemon process

pub mod error;
pub mod ipc;
pub mod notifier;
pub mod runner;
pub mod ticker;
pub mod timer;

pub use error::{TimerCommand, TimerError};
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use notifier::EventNotifier;
pub use runner::{pump_ticks, run_daemon};
pub use ticker::{
    IntervalTickProvider, ManualTickProvider, TickProvider, TickSignal, TickSource,
    TickSourceCall,
};
pub use timer::{TickOutcome, TimerEngine, TimerEvent};
