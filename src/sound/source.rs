//! Sound source selection.
//!
//! The completion sound is either a file from one of the system sound
//! directories or a tone generated at playback time.

use std::path::{Path, PathBuf};

/// Represents the source of a sound to be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// A sound file on disk.
    File {
        /// The name of the sound (file stem, e.g. "Glass").
        name: String,
        /// The full path to the sound file.
        path: PathBuf,
    },
    /// A sine tone generated at playback time.
    Tone {
        /// Frequency in Hz
        frequency_hz: u32,
        /// Length in milliseconds
        millis: u64,
    },
}

impl SoundSource {
    /// Creates a file sound source.
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::File {
            name: name.into(),
            path: path.into(),
        }
    }

    /// The generated tone used when no sound file is available.
    #[must_use]
    pub fn chime() -> Self {
        Self::Tone {
            frequency_hz: 880,
            millis: 600,
        }
    }

    /// Returns a display name for the source.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } => name,
            Self::Tone { .. } => "chime",
        }
    }
}

/// Directories searched for sound files (macOS, then freedesktop).
pub const SOUND_DIRS: &[&str] = &[
    "/System/Library/Sounds",
    "/Library/Sounds",
    "/usr/share/sounds/freedesktop/stereo",
];

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["aiff", "wav", "mp3", "flac", "ogg", "oga"];

/// Sound names tried in order when no preference is configured.
const PREFERRED_SOUND_NAMES: &[&str] = &[
    "alarm-clock-elapsed",
    "complete",
    "Glass",
    "Ping",
    "bell",
];

/// Lists the sound files found in `dirs`, sorted by name.
#[must_use]
pub fn discover_sounds_in<P: AsRef<Path>>(dirs: &[P]) -> Vec<SoundSource> {
    let mut sounds = Vec::new();

    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir.as_ref()) else {
            continue;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let supported = path
                .extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
            if !supported {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                sounds.push(SoundSource::file(stem.to_string_lossy(), path.clone()));
            }
        }
    }

    sounds.sort_by(|a, b| a.name().cmp(b.name()));
    sounds
}

/// Lists the sound files found in [`SOUND_DIRS`].
#[must_use]
pub fn discover_system_sounds() -> Vec<SoundSource> {
    discover_sounds_in(SOUND_DIRS)
}

/// Picks a sound from `available`.
///
/// A configured `preferred` name wins (case-insensitive); otherwise the
/// first of the built-in preferences, then the first available file, then
/// the generated chime.
#[must_use]
pub fn select_sound(available: &[SoundSource], preferred: Option<&str>) -> SoundSource {
    let find = |name: &str| {
        available
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    };

    if let Some(name) = preferred {
        if let Some(sound) = find(name) {
            return sound;
        }
        tracing::warn!("Sound '{}' not found, using default", name);
    }

    PREFERRED_SOUND_NAMES
        .iter()
        .find_map(|name| find(name))
        .or_else(|| available.first().cloned())
        .unwrap_or_else(SoundSource::chime)
}

/// Returns the completion sound for this system.
#[must_use]
pub fn get_default_sound(preferred: Option<&str>) -> SoundSource {
    select_sound(&discover_system_sounds(), preferred)
}
