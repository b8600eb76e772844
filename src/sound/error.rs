//! Sound system error types.

use thiserror::Error;

/// Errors that can occur while playing the completion sound.
#[derive(Debug, Error)]
pub enum SoundError {
    /// No audio output device could be opened.
    #[error("オーディオデバイスが利用できません: {0}")]
    DeviceNotAvailable(String),

    /// Sound file was not found.
    #[error("サウンドファイルが見つかりません: {0}")]
    FileNotFound(String),

    /// The sound file could not be decoded.
    #[error("サウンドファイルのデコードに失敗しました: {0}")]
    DecodeError(String),

    /// A playback sink could not be created.
    #[error("オーディオストリームの作成に失敗しました: {0}")]
    StreamError(String),

    /// The sound worker thread is no longer running.
    #[error("サウンドワーカーが停止しています")]
    WorkerStopped,

    /// Generic playback error.
    #[error("サウンド再生エラー: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns true if playback should fall back to the generated tone.
    #[must_use]
    pub fn should_fallback_to_tone(&self) -> bool {
        matches!(self, Self::FileNotFound(_) | Self::DecodeError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SoundError::DeviceNotAvailable("no device".to_string());
        assert!(err.to_string().contains("no device"));

        let err = SoundError::FileNotFound("/path/to/alarm.oga".to_string());
        assert!(err.to_string().contains("/path/to/alarm.oga"));

        assert_eq!(
            SoundError::WorkerStopped.to_string(),
            "サウンドワーカーが停止しています"
        );
    }

    #[test]
    fn test_should_fallback_to_tone() {
        assert!(SoundError::FileNotFound("x".into()).should_fallback_to_tone());
        assert!(SoundError::DecodeError("x".into()).should_fallback_to_tone());
        assert!(!SoundError::DeviceNotAvailable("x".into()).should_fallback_to_tone());
        assert!(!SoundError::PlaybackError("x".into()).should_fallback_to_tone());
    }
}
