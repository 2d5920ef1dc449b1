use thiserror::Error;

/// Application-level errors using thiserror for structured error handling.
///
/// Per-sound failures (decode, missing file) stay local to the `play()` call
/// that hit them; only device initialization is a hard failure the caller
/// may decide to abort on.

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open audio output device")]
    DeviceInit(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to load sound file: {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode sound file: {path}")]
    DecodeFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to create playback sink")]
    SinkFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid effect parameter: {0}")]
    InvalidEffectParameter(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to parse configuration from {path}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown key name: {0}")]
    UnknownKey(String),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = AudioError::InvalidEffectParameter("echo decay must be < 1".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid effect parameter: echo decay must be < 1"
        );

        let err = ConfigError::UnknownKey("superkey".to_string());
        assert_eq!(err.to_string(), "Unknown key name: superkey");
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let audio_err = AudioError::LoadFailed {
            path: "sounds/click.wav".to_string(),
            source: io_err,
        };

        assert!(audio_err.source().is_some());
        assert_eq!(
            audio_err.to_string(),
            "Failed to load sound file: sounds/click.wav"
        );
    }
}
