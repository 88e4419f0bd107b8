//! Error type shared by the player library.

use std::path::PathBuf;

/// Errors surfaced while setting up or feeding the player.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No usable audio output or the signal graph could not be built.
    /// Fatal for the whole visualizer; there is no degraded mode.
    #[error("audio processing unavailable: {0}")]
    AudioUnavailable(String),

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The selected file could not be decoded.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    /// Writing recorded audio failed.
    #[error("failed to write audio: {0}")]
    AudioWrite(#[from] hound::Error),

    /// Writing a captured frame failed.
    #[error("failed to write frame: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
