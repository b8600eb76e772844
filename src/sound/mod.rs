//! Completion sound playback.
//!
//! This module provides:
//!
//! - Sound file discovery in the system sound directories
//! - A generated chime when no sound file is available
//! - rodio-based playback on a dedicated worker thread
//!
//! # Architecture
//!
//! ```text
//! TimerEvent::Completed
//!          │
//!          ▼
//! ┌──────────────────┐  crossbeam  ┌──────────────────┐
//! │   SoundWorker    │────────────▶│ RodioSoundPlayer │
//! │  (play_async)    │             │  (worker thread) │
//! └──────────────────┘             └──────────────────┘
//! ```

mod error;
mod player;
mod source;
mod worker;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use error::SoundError;
pub use player::RodioSoundPlayer;
pub use source::{
    discover_sounds_in, discover_system_sounds, get_default_sound, select_sound, SoundSource,
    SOUND_DIRS,
};
pub use worker::SoundWorker;

/// Trait for sound playback implementations.
pub trait SoundPlayer {
    /// Starts playing a sound. Should not block for the sound's length.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play(&self, source: &SoundSource) -> Result<(), SoundError>;

    /// Blocks until every started sound has finished.
    fn wait_until_idle(&self) {}
}

impl SoundPlayer for RodioSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        RodioSoundPlayer::play(self, source)
    }

    fn wait_until_idle(&self) {
        RodioSoundPlayer::wait_until_idle(self)
    }
}

impl<T: SoundPlayer + ?Sized> SoundPlayer for Arc<T> {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        (**self).play(source)
    }

    fn wait_until_idle(&self) {
        (**self).wait_until_idle()
    }
}

/// Mock sound player for testing.
#[derive(Debug, Default)]
pub struct MockSoundPlayer {
    play_calls: Mutex<Vec<SoundSource>>,
    should_fail: AtomicBool,
    waits: AtomicUsize,
}

impl MockSoundPlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.lock_calls().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<SoundSource> {
        self.lock_calls().clone()
    }

    /// Number of times `wait_until_idle` was called.
    #[must_use]
    pub fn wait_count(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<SoundSource>> {
        self.play_calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SoundPlayer for MockSoundPlayer {
    fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.lock_calls().push(source.clone());
        Ok(())
    }

    fn wait_until_idle(&self) {
        self.waits.fetch_add(1, Ordering::SeqCst);
    }
}
