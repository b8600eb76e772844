//! Foreground countdown (`countdown run`).
//!
//! The engine lives inside one select loop together with its tick channel,
//! keyboard input and Ctrl+C, so no locking is needed.

use std::io::BufRead;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::daemon::{
    EventNotifier, IntervalTickProvider, TickOutcome, TickProvider, TickSignal, TimerEngine,
    TimerError, TimerEvent,
};
use crate::types::{format_hms, CountdownConfig, TimerStatus};

use super::display::Display;

/// How a foreground session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

/// Meaning of one line of keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Toggle,
    Cancel,
    Ignore,
}

impl InputAction {
    /// Parses a line typed by the user. Empty input toggles.
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" | "p" | "t" => Self::Toggle,
            "c" | "q" => Self::Cancel,
            _ => Self::Ignore,
        }
    }
}

/// A countdown run in the foreground.
pub struct ForegroundSession {
    engine: TimerEngine,
    event_rx: mpsc::UnboundedReceiver<TimerEvent>,
    notifier: EventNotifier,
    duration_seconds: i64,
    /// Print the countdown line
    render: bool,
}

impl ForegroundSession {
    /// Creates a session whose ticks come from `provider`.
    pub fn new(provider: Box<dyn TickProvider>, notifier: EventNotifier) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            engine: TimerEngine::new(provider, event_tx),
            event_rx,
            notifier,
            duration_seconds: 0,
            render: true,
        }
    }

    /// Disables terminal output.
    pub fn quiet(mut self) -> Self {
        self.render = false;
        self
    }

    /// Starts the countdown.
    ///
    /// # Errors
    ///
    /// Returns the engine's error if the countdown cannot start.
    pub fn start(&mut self, duration_seconds: i64) -> Result<(), TimerError> {
        self.engine.start(duration_seconds)?;
        self.duration_seconds = duration_seconds;
        Ok(())
    }

    /// Applies one line of keyboard input.
    pub fn handle_input(&mut self, line: &str) -> InputAction {
        let action = InputAction::parse(line);
        match action {
            InputAction::Toggle => {
                if let Err(e) = self.engine.toggle() {
                    debug!("Toggle ignored: {}", e);
                }
            }
            InputAction::Cancel => {
                self.engine.cancel();
            }
            InputAction::Ignore => debug!("Unknown input: {:?}", line),
        }
        action
    }

    /// Delivers a tick signal to the engine.
    pub fn on_tick(&mut self, signal: TickSignal) -> TickOutcome {
        self.engine.on_source_tick(signal.source_id)
    }

    /// Cancels the countdown if one is in progress.
    pub fn cancel(&mut self) -> bool {
        self.engine.cancel()
    }

    /// Processes pending events. Returns the outcome once the countdown ends.
    pub fn drain_events(&mut self) -> Option<SessionOutcome> {
        let mut outcome = None;
        while let Ok(event) = self.event_rx.try_recv() {
            self.notifier.handle(&event);

            if self.render {
                match &event {
                    TimerEvent::Completed => {
                        Display::finish_line(&format!(
                            "* {} のカウントダウンが完了しました",
                            format_hms(self.duration_seconds)
                        ));
                    }
                    TimerEvent::Cancelled => {
                        Display::finish_line("[] カウントダウンをキャンセルしました");
                    }
                    other => {
                        if let Some(line) = Display::format_event(other, self.duration_seconds) {
                            Display::redraw_line(&line);
                        }
                    }
                }
            }

            match event {
                TimerEvent::Completed => outcome = Some(SessionOutcome::Completed),
                TimerEvent::Cancelled => outcome = Some(SessionOutcome::Cancelled),
                _ => {}
            }
        }
        outcome
    }

    /// Current engine status.
    pub fn status(&self) -> TimerStatus {
        self.engine.status()
    }

    /// Current remaining seconds.
    pub fn remaining_seconds(&self) -> i64 {
        self.engine.remaining_seconds()
    }

    /// Runs until the countdown completes or is cancelled.
    ///
    /// Input lines come from `input_rx`; when it closes, input is ignored.
    /// Ctrl+C cancels.
    ///
    /// # Errors
    ///
    /// Returns an error if the tick channel closes while the countdown is active.
    pub async fn run(
        mut self,
        mut tick_rx: mpsc::UnboundedReceiver<TickSignal>,
        mut input_rx: mpsc::UnboundedReceiver<String>,
    ) -> Result<SessionOutcome> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut input_open = true;

        let outcome = loop {
            if let Some(outcome) = self.drain_events() {
                break outcome;
            }

            tokio::select! {
                signal = tick_rx.recv() => match signal {
                    Some(signal) => {
                        self.on_tick(signal);
                    }
                    None => anyhow::bail!("ティックソースが停止しました"),
                },
                line = input_rx.recv(), if input_open => match line {
                    Some(line) => {
                        self.handle_input(&line);
                    }
                    None => input_open = false,
                },
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        warn!("Failed to listen for Ctrl+C: {}", e);
                    }
                    self.cancel();
                }
            }
        };

        let notifier = self.notifier;
        tokio::task::spawn_blocking(move || notifier.finish())
            .await
            .context("サウンドの終了待ちに失敗しました")?;

        Ok(outcome)
    }
}

/// Reads stdin lines on a plain thread and forwards them.
///
/// The thread stays blocked on stdin after the session ends; it does not
/// hold up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Keyboard input unavailable: {}", e);
    }
    rx
}

/// Runs a foreground countdown of `duration_seconds` with the given settings.
///
/// # Errors
///
/// Returns an error if the countdown cannot start.
pub async fn run_foreground(
    config: &CountdownConfig,
    duration_seconds: i64,
) -> Result<SessionOutcome> {
    let (tick_tx, tick_rx) = mpsc::unbounded_channel();
    let provider = IntervalTickProvider::new(config.tick_interval(), tick_tx);
    let notifier = EventNotifier::from_config(&config.sound);

    let mut session = ForegroundSession::new(Box::new(provider), notifier);
    session.start(duration_seconds)?;

    session.run(tick_rx, spawn_stdin_reader()).await
}
