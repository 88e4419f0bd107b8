//! Parameter definitions with physical units and documented semantics.
//!
//! All fixed numbers of the player live here with:
//! - Physical units (Hz, dB, seconds, pixels)
//! - Documented ranges and meanings
//! - Defaults that can be overridden from a TOML file

mod audio;
mod render;

use std::path::Path;

use serde::Deserialize;

use crate::error::PlayerError;

// Re-export all types
pub use audio::{audio_constants, AnalysisConfig, EffectsConfig};
pub use render::{RecordingConfig, RenderConfig};

/// Complete player configuration
///
/// ```toml
/// [analysis]
/// fft_size = 512
///
/// [effects]
/// bass_boost_db = 12.0
///
/// [render]
/// width = 800
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub analysis: AnalysisConfig,
    pub effects: EffectsConfig,
    pub render: RenderConfig,
}

impl PlayerConfig {
    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self, PlayerError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, PlayerError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), PlayerError> {
        self.analysis
            .validate()
            .and_then(|_| self.effects.validate())
            .and_then(|_| self.render.validate())
            .map_err(PlayerError::InvalidConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PlayerConfig::from_toml(
            r#"
            [analysis]
            fft_size = 512

            [effects]
            bass_boost_db = 12.0
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.fft_size, 512);
        assert_eq!(config.analysis.smoothing_time_constant, 0.8);
        assert_eq!(config.effects.bass_boost_db, 12.0);
        assert_eq!(config.effects.fade_duration_s, 3.0);
        assert_eq!(config.render.width, 1024);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = PlayerConfig::from_toml("[analysis]\nfft_size = 100\n").unwrap_err();
        assert!(matches!(err, PlayerError::InvalidConfig(_)));

        let err = PlayerConfig::from_toml("[analysis]\nfft_size = \"big\"\n").unwrap_err();
        assert!(matches!(err, PlayerError::ConfigParse(_)));
    }
}
