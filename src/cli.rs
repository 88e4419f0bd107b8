//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use crate::error::PlayerError;
use crate::offline::SessionPlan;
use crate::params::{PlayerConfig, RecordingConfig};
use crate::visualizer::{FocusMode, VisualizerMode};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Audioscope")]
#[command(about = "Audio player with a real-time spectrum and waveform visualizer", long_about = None)]
pub struct Args {
    /// Audio file to play: wav, mp3, ogg, flac, aac/m4a (can also be dropped onto the window)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Render offline instead of playing (duration in seconds, needs FILE)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Output directory for offline recording
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output: String,

    /// Frame rate for offline recording
    #[arg(long, value_name = "FPS", default_value = "60")]
    pub fps: u32,

    /// Visualizer mode: bars (default), waveform
    #[arg(long, value_name = "MODE", default_value = "bars")]
    pub mode: String,

    /// Learning focus: none (default), amplitude, frequency
    #[arg(long, value_name = "FOCUS", default_value = "none")]
    pub focus: String,

    /// Initial volume in [0, 1]
    #[arg(long, value_name = "LEVEL")]
    pub volume: Option<f32>,

    /// Start with the bass boost on
    #[arg(long)]
    pub bass_boost: bool,

    /// Fade in from silence when playback starts
    #[arg(long)]
    pub fade_in: bool,

    /// Offline recording: start a fade-out at this time (seconds)
    #[arg(long, value_name = "SECONDS")]
    pub fade_out_at: Option<f32>,

    /// TOML file overriding the default parameters
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Load the config file (or defaults) and apply command-line overrides
    pub fn load_config(&self) -> Result<PlayerConfig, PlayerError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Config: {}", path.display());
                PlayerConfig::load(path)?
            }
            None => PlayerConfig::default(),
        };

        if let Some(volume) = self.volume {
            config.effects.initial_volume = volume;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse visualizer mode from command-line arguments
    pub fn parse_mode(&self) -> VisualizerMode {
        match self.mode.to_lowercase().as_str() {
            "bars" => VisualizerMode::Bars,
            "waveform" | "wave" => VisualizerMode::Waveform,
            other => {
                warn!("Unknown visualizer mode '{}', using bars", other);
                VisualizerMode::Bars
            }
        }
    }

    /// Parse learning focus from command-line arguments
    pub fn parse_focus(&self) -> FocusMode {
        match self.focus.to_lowercase().as_str() {
            "none" => FocusMode::None,
            "amplitude" | "amp" => FocusMode::Amplitude,
            "frequency" | "freq" => FocusMode::Frequency,
            other => {
                warn!("Unknown focus '{}', using none", other);
                FocusMode::None
            }
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| {
            let mut config = RecordingConfig::new(duration);
            config.output_dir = self.output.clone();
            config.fps = self.fps;
            config
        })
    }

    /// Effects and view settings requested on the command line
    pub fn session_plan(&self, config: &PlayerConfig) -> SessionPlan {
        SessionPlan {
            volume: config.effects.initial_volume,
            bass_boost: self.bass_boost,
            fade_in: self.fade_in,
            fade_out_at: self.fade_out_at,
            mode: self.parse_mode(),
            focus: self.parse_focus(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["audioscope"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        assert!(args.file.is_none());
        assert_eq!(args.parse_mode(), VisualizerMode::Bars);
        assert_eq!(args.parse_focus(), FocusMode::None);
        assert!(args.create_recording_config().is_none());
    }

    #[test]
    fn test_unknown_names_fall_back() {
        let args = args(&["--mode", "spiral", "--focus", "colour"]);
        assert_eq!(args.parse_mode(), VisualizerMode::Bars);
        assert_eq!(args.parse_focus(), FocusMode::None);
    }

    #[test]
    fn test_recording_plan() {
        let args = args(&[
            "song.wav",
            "--record",
            "2",
            "--fps",
            "30",
            "--output",
            "out",
            "--mode",
            "Waveform",
            "--focus",
            "freq",
            "--volume",
            "0.5",
            "--bass-boost",
            "--fade-out-at",
            "1.5",
        ]);

        let recording = args.create_recording_config().unwrap();
        assert_eq!(recording.total_frames(), 60);
        assert_eq!(recording.frames_dir(), "out/frames");

        let config = args.load_config().unwrap();
        let plan = args.session_plan(&config);
        assert_eq!(plan.volume, 0.5);
        assert!(plan.bass_boost);
        assert!(!plan.fade_in);
        assert_eq!(plan.fade_out_at, Some(1.5));
        assert_eq!(plan.mode, VisualizerMode::Waveform);
        assert_eq!(plan.focus, FocusMode::Frequency);
    }

    #[test]
    fn test_out_of_range_volume_is_rejected() {
        let args = args(&["--volume", "1.5"]);
        assert!(args.load_config().is_err());
    }
}
