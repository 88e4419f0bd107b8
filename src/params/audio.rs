//! Audio analysis and effect configuration.

use serde::Deserialize;

/// Analysis tap configuration (mirrors the browser analyser defaults)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT window size (must be power of 2, 32..=32768)
    /// Produces fft_size / 2 frequency bins per snapshot
    pub fft_size: usize,

    /// Averaging constant between successive frequency snapshots (0..1)
    pub smoothing_time_constant: f32,

    /// Magnitude (dB) mapped to byte 0
    pub min_decibels: f32,

    /// Magnitude (dB) mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalysisConfig {
    /// Number of frequency bins (and waveform samples) per snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Width of one frequency bin at the given sample rate
    pub fn hz_per_bin(&self, sample_rate_hz: u32) -> f64 {
        sample_rate_hz as f64 / self.fft_size as f64
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || !(32..=32768).contains(&self.fft_size) {
            return Err(format!(
                "FFT size must be a power of 2 in 32..=32768, got {}",
                self.fft_size
            ));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "Smoothing time constant must be in [0, 1], got {}",
                self.smoothing_time_constant
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ));
        }
        Ok(())
    }
}

/// User-facing effect parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Low-shelf cutoff used by bass boost (Hz)
    pub bass_cutoff_hz: f32,

    /// Shelf gain while bass boost is on (dB)
    pub bass_boost_db: f32,

    /// Duration of fade-in and fade-out ramps (seconds)
    pub fade_duration_s: f32,

    /// Gain level at startup (0..1)
    pub initial_volume: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            bass_cutoff_hz: 200.0,
            bass_boost_db: 15.0,
            fade_duration_s: 3.0,
            initial_volume: 1.0,
        }
    }
}

impl EffectsConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bass_cutoff_hz <= 0.0 {
            return Err(format!(
                "Bass cutoff must be > 0 Hz, got {}",
                self.bass_cutoff_hz
            ));
        }
        if self.fade_duration_s < 0.0 || !self.fade_duration_s.is_finite() {
            return Err(format!(
                "Fade duration must be a non-negative number of seconds, got {}",
                self.fade_duration_s
            ));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(format!(
                "Initial volume must be in [0, 1], got {}",
                self.initial_volume
            ));
        }
        Ok(())
    }
}

/// Audio constants (compile-time)
pub mod audio_constants {
    /// Frames processed per graph block in offline rendering
    /// 128 = one browser render quantum (2.9ms @ 44.1kHz)
    pub const BLOCK_SIZE: usize = 128;

    /// Output rate requested from the device when nothing else is known
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 44100;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bin_count() {
        let config = AnalysisConfig::default();
        assert_eq!(config.bin_count(), 128);
        assert!((config.hz_per_bin(44100) - 172.265625).abs() < 1e-9);
    }

    #[test]
    fn test_fft_size_validation() {
        let mut config = AnalysisConfig::default();
        assert!(config.validate().is_ok());

        config.fft_size = 300;
        assert!(config.validate().is_err());

        config.fft_size = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effects_validation() {
        let mut effects = EffectsConfig::default();
        assert!(effects.validate().is_ok());

        effects.initial_volume = 1.5;
        assert!(effects.validate().is_err());
    }
}
