//! Timer event consumer.
//!
//! Logs countdown progress and plays the completion sound. This is the
//! daemon's stand-in for the on-screen display.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::sound::{get_default_sound, SoundSource, SoundWorker};
use crate::types::{format_hms, SoundConfig};

use super::timer::TimerEvent;

/// Reacts to [`TimerEvent`]s.
#[derive(Debug)]
pub struct EventNotifier {
    sound: Option<(SoundWorker, SoundSource)>,
    completions: u64,
}

impl EventNotifier {
    /// Creates a notifier that never plays sound.
    pub fn silent() -> Self {
        Self {
            sound: None,
            completions: 0,
        }
    }

    /// Creates a notifier that plays `source` through `worker` on completion.
    pub fn with_sound(worker: SoundWorker, source: SoundSource) -> Self {
        Self {
            sound: Some((worker, source)),
            completions: 0,
        }
    }

    /// Builds a notifier from the sound settings.
    ///
    /// Falls back to a silent notifier if the sound worker cannot start.
    pub fn from_config(config: &SoundConfig) -> Self {
        if !config.enabled {
            debug!("Completion sound disabled");
            return Self::silent();
        }

        match SoundWorker::spawn_rodio() {
            Ok(worker) => {
                let source = get_default_sound(config.name.as_deref());
                debug!("Completion sound: {}", source.name());
                Self::with_sound(worker, source)
            }
            Err(e) => {
                warn!("Sound worker unavailable: {}", e);
                Self::silent()
            }
        }
    }

    /// Handles one event.
    pub fn handle(&mut self, event: &TimerEvent) {
        match event {
            TimerEvent::Started { duration_seconds } => {
                info!("Countdown {} started", format_hms(*duration_seconds));
            }
            TimerEvent::Tick { remaining_seconds } => {
                debug!("Remaining {}", format_hms(*remaining_seconds));
            }
            TimerEvent::Paused { remaining_seconds } => {
                info!("Paused at {}", format_hms(*remaining_seconds));
            }
            TimerEvent::Resumed { remaining_seconds } => {
                info!("Resumed at {}", format_hms(*remaining_seconds));
            }
            TimerEvent::Cancelled => info!("Countdown cancelled"),
            TimerEvent::Completed => {
                self.completions += 1;
                info!("Countdown completed");
                if let Some((worker, source)) = &self.sound {
                    if let Err(e) = worker.play_async(source.clone()) {
                        warn!("Failed to queue completion sound: {}", e);
                    }
                }
            }
        }
    }

    /// Consumes events until the channel closes, then waits for the last
    /// sound on the blocking pool.
    pub async fn run(mut self, mut event_rx: mpsc::UnboundedReceiver<TimerEvent>) {
        while let Some(event) = event_rx.recv().await {
            self.handle(&event);
        }
        if let Err(e) = tokio::task::spawn_blocking(move || self.finish()).await {
            warn!("Sound shutdown failed: {}", e);
        }
    }

    /// Number of completions seen so far.
    pub fn completions(&self) -> u64 {
        self.completions
    }

    /// Waits for any queued sound to finish playing. Blocks the thread.
    pub fn finish(self) {
        if let Some((worker, _)) = self.sound {
            worker.finish();
        }
    }
}
