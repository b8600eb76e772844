//! Tick sources for the timer engine.
//!
//! A tick source delivers one [`TickSignal`] per period while it is active.
//! Sources never hold a reference to the engine: they only push signals,
//! tagged with their own id, onto a channel owned by the host. The host
//! forwards each signal to [`TimerEngine::on_source_tick`], which discards
//! signals from sources it no longer holds.
//!
//! The first tick arrives one full period after a source is acquired, not
//! immediately. A countdown of `d` seconds therefore completes `d` periods
//! after start, and likewise a resumed countdown waits a full period before
//! its next decrement.
//!
//! [`TimerEngine::on_source_tick`]: super::timer::TimerEngine::on_source_tick

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use super::error::TimerError;

// ============================================================================
// Traits
// ============================================================================

/// A periodic tick delivered by a tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSignal {
    /// Id of the source that produced this tick
    pub source_id: u64,
}

/// Handle to an acquired tick source.
///
/// The engine owns exactly one of these while it is running or paused.
pub trait TickSource: Send {
    /// Unique id of this source within its provider.
    fn id(&self) -> u64;

    /// Stops tick delivery without releasing the source.
    fn suspend(&mut self);

    /// Restarts tick delivery after [`suspend`](Self::suspend).
    fn resume(&mut self);

    /// Releases the source. No ticks are delivered afterwards.
    ///
    /// Must be safe to call while suspended and more than once.
    fn release(&mut self);

    /// Returns true if delivery is currently suspended.
    fn is_suspended(&self) -> bool;
}

/// Factory for tick sources.
pub trait TickProvider: Send {
    /// Creates a new, active tick source.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::TickSource`] if no source can be created.
    fn acquire(&mut self) -> Result<Box<dyn TickSource>, TimerError>;
}

// ============================================================================
// IntervalTickProvider
// ============================================================================

/// Tick provider backed by `tokio::time::interval`.
///
/// Each acquired source runs as its own tokio task. The first tick arrives
/// one period after acquisition.
pub struct IntervalTickProvider {
    period: Duration,
    tick_tx: mpsc::UnboundedSender<TickSignal>,
    next_id: u64,
}

impl IntervalTickProvider {
    /// Creates a provider that sends ticks every `period` to `tick_tx`.
    pub fn new(period: Duration, tick_tx: mpsc::UnboundedSender<TickSignal>) -> Self {
        Self {
            period,
            tick_tx,
            next_id: 1,
        }
    }
}

impl TickProvider for IntervalTickProvider {
    fn acquire(&mut self) -> Result<Box<dyn TickSource>, TimerError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| TimerError::TickSource(e.to_string()))?;

        let id = self.next_id;
        self.next_id += 1;

        let (suspend_tx, suspend_rx) = watch::channel(false);
        let task = handle.spawn(tick_loop(
            id,
            self.period,
            self.tick_tx.clone(),
            suspend_rx,
        ));

        debug!(source_id = id, period_ms = self.period.as_millis() as u64, "Tick source acquired");

        Ok(Box::new(IntervalTickSource {
            id,
            suspend_tx,
            task: Some(task),
        }))
    }
}

/// Sends ticks until the task is aborted or the receiver is gone.
async fn tick_loop(
    id: u64,
    period: Duration,
    tick_tx: mpsc::UnboundedSender<TickSignal>,
    mut suspended: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *suspended.borrow_and_update() {
            if suspended.wait_for(|s| !*s).await.is_err() {
                return;
            }
            // Count a full period from the moment of resumption.
            ticker.reset();
        }

        tokio::select! {
            _ = ticker.tick() => {
                if *suspended.borrow() {
                    continue;
                }
                if tick_tx.send(TickSignal { source_id: id }).is_err() {
                    return;
                }
            }
            changed = suspended.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

/// Tick source handle returned by [`IntervalTickProvider`].
struct IntervalTickSource {
    id: u64,
    suspend_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TickSource for IntervalTickSource {
    fn id(&self) -> u64 {
        self.id
    }

    fn suspend(&mut self) {
        self.suspend_tx.send_replace(true);
        debug!(source_id = self.id, "Tick source suspended");
    }

    fn resume(&mut self) {
        self.suspend_tx.send_replace(false);
        debug!(source_id = self.id, "Tick source resumed");
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(source_id = self.id, "Tick source released");
        }
    }

    fn is_suspended(&self) -> bool {
        *self.suspend_tx.borrow()
    }
}

impl Drop for IntervalTickSource {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// ManualTickProvider
// ============================================================================

/// Calls observed by a [`ManualTickProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSourceCall {
    Acquired(u64),
    Suspended(u64),
    Resumed(u64),
    Released(u64),
}

#[derive(Debug, Default)]
struct ManualState {
    next_id: u64,
    calls: Vec<TickSourceCall>,
    active: Vec<u64>,
    suspended: Vec<u64>,
    fail_acquire: bool,
}

/// Tick provider that ticks only on demand, through [`tick`](Self::tick).
///
/// Clones share state, so a test can hand one clone to the engine and keep
/// another to inspect the calls the engine made.
#[derive(Debug, Clone, Default)]
pub struct ManualTickProvider {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTickProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next acquisitions fail (or succeed again).
    pub fn set_fail_acquire(&self, fail: bool) {
        self.lock().fail_acquire = fail;
    }

    /// Returns every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TickSourceCall> {
        self.lock().calls.clone()
    }

    /// Returns the ids of sources acquired and not yet released.
    #[must_use]
    pub fn active_sources(&self) -> Vec<u64> {
        self.lock().active.clone()
    }

    /// Returns true if the given source is currently suspended.
    #[must_use]
    pub fn is_suspended(&self, id: u64) -> bool {
        self.lock().suspended.contains(&id)
    }

    /// Emits one tick from the most recently acquired live source.
    ///
    /// Returns `None` when no source is held or that source is suspended,
    /// matching a real source that stays silent while suspended.
    #[must_use]
    pub fn tick(&self) -> Option<TickSignal> {
        let state = self.lock();
        let id = *state.active.last()?;
        if state.suspended.contains(&id) {
            return None;
        }
        Some(TickSignal { source_id: id })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        // A poisoned lock only means a test panicked while holding it.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TickProvider for ManualTickProvider {
    fn acquire(&mut self) -> Result<Box<dyn TickSource>, TimerError> {
        let mut state = self.lock();
        if state.fail_acquire {
            return Err(TimerError::TickSource("manual provider refused".to_string()));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.calls.push(TickSourceCall::Acquired(id));
        state.active.push(id);
        drop(state);

        Ok(Box::new(ManualTickSource {
            id,
            released: false,
            provider: self.clone(),
        }))
    }
}

struct ManualTickSource {
    id: u64,
    released: bool,
    provider: ManualTickProvider,
}

impl TickSource for ManualTickSource {
    fn id(&self) -> u64 {
        self.id
    }

    fn suspend(&mut self) {
        let mut state = self.provider.lock();
        state.calls.push(TickSourceCall::Suspended(self.id));
        if !state.suspended.contains(&self.id) {
            state.suspended.push(self.id);
        }
    }

    fn resume(&mut self) {
        let mut state = self.provider.lock();
        state.calls.push(TickSourceCall::Resumed(self.id));
        state.suspended.retain(|id| *id != self.id);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut state = self.provider.lock();
        state.calls.push(TickSourceCall::Released(self.id));
        state.active.retain(|id| *id != self.id);
        state.suspended.retain(|id| *id != self.id);
    }

    fn is_suspended(&self) -> bool {
        self.provider.is_suspended(self.id)
    }
}

// ============================================================================
// Tests
// ============================================================================
