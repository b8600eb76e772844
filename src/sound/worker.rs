//! Background thread that owns the audio output.
//!
//! The timer side never touches the audio device: it sends a
//! [`SoundSource`] over a crossbeam channel and returns immediately.

use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Sender};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::SoundSource;
use super::SoundPlayer;

/// Handle to the sound worker thread.
pub struct SoundWorker {
    tx: Option<Sender<SoundSource>>,
    handle: Option<JoinHandle<()>>,
}

impl SoundWorker {
    /// Spawns the worker. `make_player` runs on the worker thread.
    ///
    /// If the player cannot be created, requests are accepted and dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(make_player: F) -> Result<Self, SoundError>
    where
        F: FnOnce() -> Result<Box<dyn SoundPlayer>, SoundError> + Send + 'static,
    {
        let (tx, rx) = unbounded::<SoundSource>();

        let handle = std::thread::Builder::new()
            .name("sound-worker".to_string())
            .spawn(move || {
                let player = match make_player() {
                    Ok(player) => player,
                    Err(e) => {
                        warn!("Audio not available, sound disabled: {}", e);
                        for _ in rx.iter() {}
                        return;
                    }
                };

                for source in rx.iter() {
                    debug!("Playing completion sound: {}", source.name());
                    if let Err(e) = player.play(&source) {
                        warn!("Failed to play sound: {}", e);
                    }
                }

                player.wait_until_idle();
            })
            .map_err(|e| SoundError::PlaybackError(e.to_string()))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Spawns a worker backed by the default output device.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn_rodio() -> Result<Self, SoundError> {
        Self::spawn(|| {
            super::RodioSoundPlayer::new().map(|p| Box::new(p) as Box<dyn SoundPlayer>)
        })
    }

    /// Queues `source` for playback without blocking.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::WorkerStopped` if the worker has exited.
    pub fn play_async(&self, source: SoundSource) -> Result<(), SoundError> {
        self.tx
            .as_ref()
            .ok_or(SoundError::WorkerStopped)?
            .send(source)
            .map_err(|_| SoundError::WorkerStopped)
    }

    /// Stops accepting requests and waits for queued sounds to finish.
    ///
    /// Blocks the calling thread for as long as the sounds play. From async
    /// code, call it through `tokio::task::spawn_blocking`.
    pub fn finish(mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Sound worker panicked");
            }
        }
    }
}

/// Dropping the handle closes the queue without waiting. The thread plays
/// what is already queued and exits on its own.
impl Drop for SoundWorker {
    fn drop(&mut self) {
        self.tx.take();
        self.handle.take();
    }
}

impl std::fmt::Debug for SoundWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundWorker")
            .field("running", &self.tx.is_some())
            .finish()
    }
}
