//! Sound player implementation using rodio.

use std::fs::File;
use std::io::BufReader;
use std::sync::Mutex;
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::error::SoundError;
use super::source::SoundSource;

/// Amplitude applied to generated tones.
const TONE_VOLUME: f32 = 0.25;

/// A sound player that uses rodio for audio playback.
///
/// The output stream is not `Send` on every platform, so the player should
/// live on the thread that created it (see [`SoundWorker`](super::SoundWorker)).
pub struct RodioSoundPlayer {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    /// Sinks that may still be playing
    sinks: Mutex<Vec<Sink>>,
}

impl RodioSoundPlayer {
    /// Opens the default output device.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no output device exists.
    pub fn new() -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        debug!("Audio output stream initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sinks: Mutex::new(Vec::new()),
        })
    }

    /// Starts playing `source` without blocking.
    ///
    /// Files that cannot be opened or decoded fall back to the chime.
    ///
    /// # Errors
    ///
    /// Returns an error if no sink can be created.
    pub fn play(&self, source: &SoundSource) -> Result<(), SoundError> {
        match source {
            SoundSource::File { name, path } => match self.play_file(path) {
                Err(e) if e.should_fallback_to_tone() => {
                    warn!("Failed to play '{}': {}, falling back to chime", name, e);
                    self.play(&SoundSource::chime())
                }
                other => other,
            },
            SoundSource::Tone {
                frequency_hz,
                millis,
            } => self.play_tone(*frequency_hz, *millis),
        }
    }

    fn play_file(&self, path: &std::path::Path) -> Result<(), SoundError> {
        let file = File::open(path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let decoder = Decoder::new(BufReader::new(file))
            .map_err(|e| SoundError::DecodeError(e.to_string()))?;

        let sink = self.new_sink()?;
        sink.append(decoder);
        self.keep(sink);
        Ok(())
    }

    fn play_tone(&self, frequency_hz: u32, millis: u64) -> Result<(), SoundError> {
        let tone = SineWave::new(frequency_hz as f32)
            .take_duration(Duration::from_millis(millis))
            .amplify(TONE_VOLUME);

        let sink = self.new_sink()?;
        sink.append(tone);
        self.keep(sink);
        Ok(())
    }

    fn new_sink(&self) -> Result<Sink, SoundError> {
        Sink::try_new(&self.stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))
    }

    fn keep(&self, sink: Sink) {
        let mut sinks = self.sinks.lock().unwrap_or_else(|e| e.into_inner());
        sinks.retain(|s| !s.empty());
        sinks.push(sink);
        debug!("Sound playback started");
    }

    /// Blocks until every started sound has finished.
    pub fn wait_until_idle(&self) {
        let sinks = std::mem::take(&mut *self.sinks.lock().unwrap_or_else(|e| e.into_inner()));
        for sink in sinks {
            sink.sleep_until_end();
        }
    }
}

impl std::fmt::Debug for RodioSoundPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioSoundPlayer").finish_non_exhaustive()
    }
}
