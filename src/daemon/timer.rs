//! Timer engine for the countdown timer.
//!
//! This module provides the countdown state machine:
//! - State transitions (Idle → Running ⇄ Paused → Idle)
//! - One-second decrements driven by an external tick source
//! - Event firing for display updates and the completion sound
//!
//! The engine does not own a clock. It acquires a [`TickSource`] on start,
//! suspends it while paused and releases it on cancel or completion.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::types::{TimerSnapshot, TimerStatus};

use super::error::{TimerCommand, TimerError};
use super::ticker::{TickProvider, TickSource};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for display updates and notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown started
    Started {
        /// Countdown length in seconds
        duration_seconds: i64,
    },
    /// One tick applied
    Tick {
        /// Remaining seconds after the decrement (zero or negative on the last tick)
        remaining_seconds: i64,
    },
    /// Countdown paused
    Paused {
        /// Remaining seconds at the moment of pausing
        remaining_seconds: i64,
    },
    /// Countdown resumed
    Resumed {
        /// Remaining seconds at the moment of resuming
        remaining_seconds: i64,
    },
    /// Countdown cancelled before completion
    Cancelled,
    /// Countdown reached zero
    Completed,
}

/// Result of delivering a tick to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick was not applied (engine not running, or stale source)
    Ignored,
    /// The tick was applied and the countdown continues
    Counted {
        /// Remaining seconds after the decrement
        remaining_seconds: i64,
    },
    /// The tick was applied and completed the countdown
    Completed {
        /// Remaining seconds reported on the final tick
        remaining_seconds: i64,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Countdown state machine.
///
/// All methods must be called from one serialization point (a mutex or a
/// single task); the engine itself does no locking.
pub struct TimerEngine {
    status: TimerStatus,
    duration_seconds: i64,
    remaining_seconds: i64,
    /// Held if and only if status is Running or Paused
    source: Option<Box<dyn TickSource>>,
    provider: Box<dyn TickProvider>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine.
    pub fn new(
        provider: Box<dyn TickProvider>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            status: TimerStatus::Idle,
            duration_seconds: 0,
            remaining_seconds: 0,
            source: None,
            provider,
            event_tx,
        }
    }

    /// Starts a countdown of `duration_seconds`.
    ///
    /// # Errors
    ///
    /// - [`TimerError::InvalidDuration`] if `duration_seconds <= 0`
    /// - [`TimerError::InvalidTransition`] if a countdown is already in progress
    /// - [`TimerError::TickSource`] if no tick source could be acquired
    ///
    /// The engine stays idle on every error.
    pub fn start(&mut self, duration_seconds: i64) -> Result<(), TimerError> {
        if duration_seconds <= 0 {
            return Err(TimerError::InvalidDuration(duration_seconds));
        }
        if self.status != TimerStatus::Idle {
            return Err(self.invalid(TimerCommand::Start));
        }

        let source = self.provider.acquire()?;

        self.duration_seconds = duration_seconds;
        self.remaining_seconds = duration_seconds;
        self.source = Some(source);
        self.status = TimerStatus::Running;

        info!(duration_seconds, "Countdown started");
        self.emit(TimerEvent::Started { duration_seconds });
        Ok(())
    }

    /// Pauses a running countdown or resumes a paused one.
    ///
    /// Returns the new status.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidTransition`] if the engine is idle.
    pub fn toggle(&mut self) -> Result<TimerStatus, TimerError> {
        let remaining_seconds = self.remaining_seconds;

        match self.status {
            TimerStatus::Idle => Err(self.invalid(TimerCommand::Toggle)),
            TimerStatus::Running => {
                if let Some(source) = self.source.as_mut() {
                    source.suspend();
                }
                self.status = TimerStatus::Paused;
                info!(remaining_seconds, "Countdown paused");
                self.emit(TimerEvent::Paused { remaining_seconds });
                Ok(self.status)
            }
            TimerStatus::Paused => {
                if let Some(source) = self.source.as_mut() {
                    source.resume();
                }
                self.status = TimerStatus::Running;
                info!(remaining_seconds, "Countdown resumed");
                self.emit(TimerEvent::Resumed { remaining_seconds });
                Ok(self.status)
            }
        }
    }

    /// Cancels the countdown.
    ///
    /// Does nothing when idle. Returns true if a countdown was cancelled.
    pub fn cancel(&mut self) -> bool {
        if !self.status.is_active() {
            debug!("Cancel ignored: timer is idle");
            return false;
        }

        self.release_source();
        self.status = TimerStatus::Idle;
        self.remaining_seconds = 0;

        info!("Countdown cancelled");
        self.emit(TimerEvent::Cancelled);
        true
    }

    /// Advances the countdown by one second.
    ///
    /// Ticks that arrive while paused or idle are ignored.
    pub fn on_tick(&mut self) -> TickOutcome {
        match self.status {
            TimerStatus::Running => {}
            TimerStatus::Paused => {
                warn!("Tick delivered while paused; ignoring");
                return TickOutcome::Ignored;
            }
            TimerStatus::Idle => {
                debug!("Tick delivered while idle; ignoring");
                return TickOutcome::Ignored;
            }
        }

        self.remaining_seconds -= 1;
        let remaining_seconds = self.remaining_seconds;
        debug!(remaining_seconds, "Tick");
        self.emit(TimerEvent::Tick { remaining_seconds });

        if remaining_seconds > 0 {
            return TickOutcome::Counted { remaining_seconds };
        }

        self.emit(TimerEvent::Completed);
        self.release_source();
        self.status = TimerStatus::Idle;
        self.remaining_seconds = 0;
        info!("Countdown completed");

        TickOutcome::Completed { remaining_seconds }
    }

    /// Applies a tick produced by the source with the given id.
    ///
    /// Ticks from a source the engine no longer holds are discarded. A tick
    /// from the current source can still arrive just after a pause if it was
    /// queued before the source was suspended; it is ignored quietly.
    pub fn on_source_tick(&mut self, source_id: u64) -> TickOutcome {
        match self.source.as_ref().map(|s| s.id()) {
            Some(id) if id == source_id && self.status == TimerStatus::Paused => {
                debug!(source_id, "Tick queued before pause discarded");
                TickOutcome::Ignored
            }
            Some(id) if id == source_id => self.on_tick(),
            _ => {
                debug!(source_id, "Tick from stale source discarded");
                TickOutcome::Ignored
            }
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    /// Returns the configured duration of the current (or last) countdown.
    pub fn duration_seconds(&self) -> i64 {
        self.duration_seconds
    }

    /// Returns the remaining seconds.
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_seconds
    }

    /// Returns true while a tick source is held.
    pub fn has_tick_source(&self) -> bool {
        self.source.is_some()
    }

    /// Returns a snapshot of the engine.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            status: self.status,
            duration_seconds: self.duration_seconds,
            remaining_seconds: self.remaining_seconds,
        }
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
        }
    }

    fn invalid(&self, command: TimerCommand) -> TimerError {
        TimerError::InvalidTransition {
            state: self.status,
            command,
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.release_source();
    }
}

impl std::fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("status", &self.status)
            .field("duration_seconds", &self.duration_seconds)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("source", &self.source.as_ref().map(|s| s.id()))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::ticker::{ManualTickProvider, TickSourceCall};

    fn create_engine() -> (
        TimerEngine,
        ManualTickProvider,
        mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let provider = ManualTickProvider::new();
        let engine = TimerEngine::new(Box::new(provider.clone()), tx);
        (engine, provider, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ------------------------------------------------------------------------
    // Start Tests
    // ------------------------------------------------------------------------

    mod start_tests {
        use super::*;

        #[test]
        fn test_new_engine_is_idle() {
            let (engine, _provider, _rx) = create_engine();

            assert_eq!(engine.status(), TimerStatus::Idle);
            assert_eq!(engine.remaining_seconds(), 0);
            assert!(!engine.has_tick_source());
        }

        #[test]
        fn test_start() {
            let (mut engine, provider, mut rx) = create_engine();

            engine.start(90).unwrap();

            assert_eq!(engine.status(), TimerStatus::Running);
            assert_eq!(engine.duration_seconds(), 90);
            assert_eq!(engine.remaining_seconds(), 90);
            assert!(engine.has_tick_source());
            assert_eq!(provider.active_sources().len(), 1);
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Started {
                    duration_seconds: 90
                }
            );
        }

        #[test]
        fn test_start_sets_remaining_for_many_durations() {
            for d in [1, 2, 59, 60, 3600, 86_400] {
                let (mut engine, _provider, _rx) = create_engine();
                engine.start(d).unwrap();
                assert_eq!(engine.status(), TimerStatus::Running);
                assert_eq!(engine.remaining_seconds(), d);
            }
        }

        #[test]
        fn test_start_invalid_duration() {
            for d in [0, -5] {
                let (mut engine, provider, mut rx) = create_engine();

                let result = engine.start(d);

                assert_eq!(result, Err(TimerError::InvalidDuration(d)));
                assert_eq!(engine.status(), TimerStatus::Idle);
                assert!(provider.calls().is_empty());
                assert!(rx.try_recv().is_err());
            }
        }

        #[test]
        fn test_start_while_running() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(10).unwrap();

            let result = engine.start(20);

            assert_eq!(
                result,
                Err(TimerError::InvalidTransition {
                    state: TimerStatus::Running,
                    command: TimerCommand::Start,
                })
            );
            assert_eq!(engine.duration_seconds(), 10);
            assert_eq!(provider.active_sources().len(), 1);
        }

        #[test]
        fn test_start_while_paused() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(10).unwrap();
            engine.toggle().unwrap();

            let result = engine.start(20);

            assert!(matches!(
                result,
                Err(TimerError::InvalidTransition {
                    state: TimerStatus::Paused,
                    ..
                })
            ));
            assert_eq!(engine.remaining_seconds(), 10);
            assert_eq!(provider.active_sources().len(), 1);
        }

        #[test]
        fn test_start_tick_source_failure_stays_idle() {
            let (mut engine, provider, mut rx) = create_engine();
            provider.set_fail_acquire(true);

            let result = engine.start(10);

            assert!(matches!(result, Err(TimerError::TickSource(_))));
            assert_eq!(engine.status(), TimerStatus::Idle);
            assert!(!engine.has_tick_source());
            assert!(rx.try_recv().is_err());

            provider.set_fail_acquire(false);
            assert!(engine.start(10).is_ok());
        }
    }

    // ------------------------------------------------------------------------
    // Toggle Tests
    // ------------------------------------------------------------------------

    mod toggle_tests {
        use super::*;

        #[test]
        fn test_toggle_idle_fails() {
            let (mut engine, _provider, _rx) = create_engine();

            let result = engine.toggle();

            assert_eq!(
                result,
                Err(TimerError::InvalidTransition {
                    state: TimerStatus::Idle,
                    command: TimerCommand::Toggle,
                })
            );
            assert_eq!(engine.status(), TimerStatus::Idle);
        }

        #[test]
        fn test_toggle_pauses_and_resumes() {
            let (mut engine, provider, mut rx) = create_engine();
            engine.start(5).unwrap();
            let id = provider.active_sources()[0];
            drain(&mut rx);

            assert_eq!(engine.toggle().unwrap(), TimerStatus::Paused);
            assert!(provider.is_suspended(id));
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Paused {
                    remaining_seconds: 5
                }
            );

            assert_eq!(engine.toggle().unwrap(), TimerStatus::Running);
            assert!(!provider.is_suspended(id));
            assert_eq!(
                rx.try_recv().unwrap(),
                TimerEvent::Resumed {
                    remaining_seconds: 5
                }
            );
        }

        #[test]
        fn test_toggle_symmetry_preserves_remaining() {
            let (mut engine, _provider, _rx) = create_engine();
            engine.start(30).unwrap();
            engine.on_tick();
            engine.on_tick();
            let before = engine.remaining_seconds();

            engine.toggle().unwrap();
            engine.toggle().unwrap();

            assert_eq!(engine.remaining_seconds(), before);
            assert_eq!(engine.status(), TimerStatus::Running);
        }

        #[test]
        fn test_pause_retains_source() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(5).unwrap();

            engine.toggle().unwrap();

            assert!(engine.has_tick_source());
            assert_eq!(provider.active_sources().len(), 1);
            assert!(!provider
                .calls()
                .iter()
                .any(|c| matches!(c, TickSourceCall::Released(_))));
        }
    }

    // ------------------------------------------------------------------------
    // Cancel Tests
    // ------------------------------------------------------------------------

    mod cancel_tests {
        use super::*;

        #[test]
        fn test_cancel_idle_is_noop() {
            let (mut engine, provider, mut rx) = create_engine();

            assert!(!engine.cancel());
            assert!(!engine.cancel());

            assert_eq!(engine.status(), TimerStatus::Idle);
            assert!(provider.calls().is_empty());
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_cancel_running() {
            let (mut engine, provider, mut rx) = create_engine();
            engine.start(10).unwrap();
            engine.on_tick();
            drain(&mut rx);

            assert!(engine.cancel());

            assert_eq!(engine.status(), TimerStatus::Idle);
            assert_eq!(engine.remaining_seconds(), 0);
            assert!(!engine.has_tick_source());
            assert!(provider.active_sources().is_empty());
            assert_eq!(rx.try_recv().unwrap(), TimerEvent::Cancelled);
        }

        #[test]
        fn test_cancel_paused_releases_without_resume() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(5).unwrap();
            let id = provider.active_sources()[0];
            engine.toggle().unwrap();

            assert!(engine.cancel());

            assert_eq!(engine.status(), TimerStatus::Idle);
            assert_eq!(
                provider.calls(),
                vec![
                    TickSourceCall::Acquired(id),
                    TickSourceCall::Suspended(id),
                    TickSourceCall::Released(id),
                ]
            );
        }

        #[test]
        fn test_no_ticks_accepted_after_cancel() {
            let (mut engine, provider, mut rx) = create_engine();
            engine.start(5).unwrap();
            let id = provider.active_sources()[0];
            engine.toggle().unwrap();
            engine.cancel();
            drain(&mut rx);

            assert_eq!(engine.on_tick(), TickOutcome::Ignored);
            assert_eq!(engine.on_source_tick(id), TickOutcome::Ignored);
            assert_eq!(engine.remaining_seconds(), 0);
            assert!(rx.try_recv().is_err());
        }
    }

    // ------------------------------------------------------------------------
    // Tick Tests
    // ------------------------------------------------------------------------

    mod tick_tests {
        use super::*;

        #[test]
        fn test_three_second_scenario() {
            let (mut engine, provider, mut rx) = create_engine();
            engine.start(3).unwrap();
            drain(&mut rx);

            assert_eq!(
                engine.on_tick(),
                TickOutcome::Counted {
                    remaining_seconds: 2
                }
            );
            assert_eq!(
                engine.on_tick(),
                TickOutcome::Counted {
                    remaining_seconds: 1
                }
            );
            assert_eq!(
                engine.on_tick(),
                TickOutcome::Completed {
                    remaining_seconds: 0
                }
            );

            assert_eq!(
                drain(&mut rx),
                vec![
                    TimerEvent::Tick {
                        remaining_seconds: 2
                    },
                    TimerEvent::Tick {
                        remaining_seconds: 1
                    },
                    TimerEvent::Tick {
                        remaining_seconds: 0
                    },
                    TimerEvent::Completed,
                ]
            );
            assert_eq!(engine.status(), TimerStatus::Idle);
            assert!(!engine.has_tick_source());
            assert!(provider.active_sources().is_empty());
        }

        #[test]
        fn test_completion_exactly_once_on_last_tick() {
            for d in 1..=25 {
                let (mut engine, _provider, mut rx) = create_engine();
                engine.start(d).unwrap();
                drain(&mut rx);

                let mut last_remaining = None;
                for i in 1..=d {
                    match engine.on_tick() {
                        TickOutcome::Counted { remaining_seconds } => {
                            assert!(i < d, "completed late for d={}", d);
                            last_remaining = Some(remaining_seconds);
                        }
                        TickOutcome::Completed { remaining_seconds } => {
                            assert_eq!(i, d, "completed early for d={}", d);
                            last_remaining = Some(remaining_seconds);
                        }
                        TickOutcome::Ignored => panic!("tick ignored while running"),
                    }
                }

                assert!(last_remaining.unwrap() <= 0);
                let completed = drain(&mut rx)
                    .into_iter()
                    .filter(|e| *e == TimerEvent::Completed)
                    .count();
                assert_eq!(completed, 1, "d={}", d);
                assert_eq!(engine.on_tick(), TickOutcome::Ignored);
            }
        }

        #[test]
        fn test_tick_while_paused_is_ignored() {
            let (mut engine, _provider, mut rx) = create_engine();
            engine.start(5).unwrap();
            engine.toggle().unwrap();
            drain(&mut rx);

            assert_eq!(engine.on_tick(), TickOutcome::Ignored);

            assert_eq!(engine.remaining_seconds(), 5);
            assert_eq!(engine.status(), TimerStatus::Paused);
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_tick_queued_before_pause_is_ignored() {
            let (mut engine, provider, mut rx) = create_engine();
            engine.start(5).unwrap();
            let queued = provider.tick().unwrap();
            engine.toggle().unwrap();
            drain(&mut rx);

            assert_eq!(engine.on_source_tick(queued.source_id), TickOutcome::Ignored);

            assert_eq!(engine.remaining_seconds(), 5);
            assert_eq!(engine.status(), TimerStatus::Paused);
            assert!(engine.has_tick_source());
            assert!(rx.try_recv().is_err());
            assert_eq!(provider.tick(), None);

            engine.toggle().unwrap();
            let signal = provider.tick().unwrap();
            assert_eq!(
                engine.on_source_tick(signal.source_id),
                TickOutcome::Counted {
                    remaining_seconds: 4
                }
            );
        }

        #[test]
        fn test_tick_while_idle_is_ignored() {
            let (mut engine, _provider, mut rx) = create_engine();

            assert_eq!(engine.on_tick(), TickOutcome::Ignored);
            assert!(rx.try_recv().is_err());
        }

        #[test]
        fn test_stale_source_tick_discarded() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(5).unwrap();
            let first = provider.active_sources()[0];
            engine.cancel();
            engine.start(5).unwrap();
            let second = provider.active_sources()[0];
            assert_ne!(first, second);

            assert_eq!(engine.on_source_tick(first), TickOutcome::Ignored);
            assert_eq!(engine.remaining_seconds(), 5);

            assert_eq!(
                engine.on_source_tick(second),
                TickOutcome::Counted {
                    remaining_seconds: 4
                }
            );
        }

        #[test]
        fn test_restart_after_completion() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(1).unwrap();
            engine.on_tick();
            assert_eq!(engine.status(), TimerStatus::Idle);

            engine.start(2).unwrap();

            assert_eq!(engine.status(), TimerStatus::Running);
            assert_eq!(engine.remaining_seconds(), 2);
            assert_eq!(provider.active_sources().len(), 1);
        }
    }

    // ------------------------------------------------------------------------
    // Misc Tests
    // ------------------------------------------------------------------------

    mod misc_tests {
        use super::*;

        #[test]
        fn test_snapshot() {
            let (mut engine, _provider, _rx) = create_engine();
            engine.start(60).unwrap();
            engine.on_tick();

            let snapshot = engine.snapshot();
            assert_eq!(snapshot.status, TimerStatus::Running);
            assert_eq!(snapshot.duration_seconds, 60);
            assert_eq!(snapshot.remaining_seconds, 59);
        }

        #[test]
        fn test_events_survive_dropped_receiver() {
            let (mut engine, _provider, rx) = create_engine();
            drop(rx);

            engine.start(1).unwrap();
            assert_eq!(
                engine.on_tick(),
                TickOutcome::Completed {
                    remaining_seconds: 0
                }
            );
        }

        #[test]
        fn test_drop_releases_source() {
            let (mut engine, provider, _rx) = create_engine();
            engine.start(5).unwrap();

            drop(engine);

            assert!(provider.active_sources().is_empty());
        }

        #[test]
        fn test_debug_impl() {
            let (engine, _provider, _rx) = create_engine();
            let debug_str = format!("{:?}", engine);
            assert!(debug_str.contains("TimerEngine"));
            assert!(debug_str.contains("Idle"));
        }
    }

    // ------------------------------------------------------------------------
    // Integration Tests with Tokio Runtime
    // ------------------------------------------------------------------------

    mod interval_tests {
        use super::*;
        use crate::daemon::ticker::IntervalTickProvider;
        use tokio::time::{timeout, Duration};

        #[tokio::test(start_paused = true)]
        async fn test_engine_counts_down_with_interval_source() {
            let (event_tx, mut event_rx) = mpsc::unbounded_channel();
            let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
            let provider = IntervalTickProvider::new(Duration::from_secs(1), tick_tx);
            let mut engine = TimerEngine::new(Box::new(provider), event_tx);

            engine.start(3).unwrap();

            let mut completed = false;
            while !completed {
                let signal = timeout(Duration::from_secs(5), tick_rx.recv())
                    .await
                    .unwrap()
                    .unwrap();
                completed = matches!(
                    engine.on_source_tick(signal.source_id),
                    TickOutcome::Completed { .. }
                );
            }

            assert_eq!(engine.status(), TimerStatus::Idle);
            let events = drain(&mut event_rx);
            assert_eq!(events.last(), Some(&TimerEvent::Completed));
        }
    }
}
