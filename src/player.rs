//! Player state: owns every component and consumes UI events.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::audio::{AnalysisSampler, AnalysisSnapshot, AudioMetrics, GraphHandle};
use crate::controller::ParameterController;
use crate::media::{format_time, DecodedAudio, MediaHandle};
use crate::params::PlayerConfig;
use crate::visualizer::{self, FocusMode, RenderSurface, VisualizerMode};

/// Input from the UI controls surface
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    Play,
    Pause,
    Stop,
    /// Absolute position in seconds
    Seek(f64),
    /// Relative jump in seconds
    SeekBy(f64),
    VolumeChanged(f32),
    BassBoostToggled,
    FadeIn,
    FadeOut,
    ModeSelected(VisualizerMode),
    FocusSelected(FocusMode),
    /// `None` when the picker was dismissed
    FileSelected(Option<PathBuf>),
}

/// Readouts produced alongside each rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub metrics: AudioMetrics,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub progress_percent: Option<f32>,
    pub buffered_percent: Option<f32>,
    pub playing: bool,
    /// Low-shelf boost engaged
    pub bass_boost: bool,
    /// A fade-in or fade-out ramp is still running
    pub fading: bool,
}

impl FrameInfo {
    /// `m:ss / m:ss | amp X.Y% | N Hz | mode | bass on`, plus `| fading` mid-ramp
    pub fn readout(&self, mode: VisualizerMode) -> String {
        let mut text = format!(
            "{} / {} | amp {:.1}% | {} Hz | {} | bass {}",
            format_time(self.current_time),
            format_time(self.duration.unwrap_or(0.0)),
            self.metrics.amplitude_percent,
            self.metrics.dominant_frequency_hz,
            mode.name(),
            if self.bass_boost { "on" } else { "off" }
        );
        if self.fading {
            text.push_str(" | fading");
        }
        text
    }
}

/// Explicit owner of everything the callbacks used to share
pub struct Player {
    media: MediaHandle,
    controller: ParameterController,
    sampler: AnalysisSampler,
    mode: VisualizerMode,
    focus: FocusMode,
    volume: f32,
    sample_rate_hz: u32,
    fft_size: usize,
}

impl Player {
    /// Wire a player around an initialized graph reading from `media`
    pub fn new(graph: GraphHandle, media: MediaHandle, config: &PlayerConfig) -> Self {
        let sample_rate_hz = graph.lock().sample_rate_hz();
        let sampler = AnalysisSampler::new(graph.analysis_tap(), config.analysis.clone());
        let controller = ParameterController::new(graph, config.effects.clone());

        Self {
            media,
            controller,
            sampler,
            mode: VisualizerMode::default(),
            focus: FocusMode::default(),
            volume: config.effects.initial_volume,
            sample_rate_hz,
            fft_size: config.analysis.fft_size,
        }
    }

    pub fn mode(&self) -> VisualizerMode {
        self.mode
    }

    pub fn focus(&self) -> FocusMode {
        self.focus
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn bass_boost_enabled(&self) -> bool {
        self.controller.bass_boost_enabled()
    }

    pub fn media(&self) -> &MediaHandle {
        &self.media
    }

    pub fn controller(&self) -> &ParameterController {
        &self.controller
    }

    pub fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Play => self.media.lock().play(),
            ControlEvent::Pause => self.media.lock().pause(),
            ControlEvent::Stop => self.media.lock().stop(),
            ControlEvent::Seek(secs) => self.media.lock().seek(secs),
            ControlEvent::SeekBy(delta) => {
                let mut media = self.media.lock();
                let target = media.current_time() + delta;
                media.seek(target);
            }
            ControlEvent::VolumeChanged(level) => {
                // NaN maps to silence, as in the gain parameter
                self.volume = if level.is_nan() {
                    0.0
                } else {
                    level.clamp(0.0, 1.0)
                };
                self.controller.set_volume(self.volume);
            }
            ControlEvent::BassBoostToggled => {
                self.controller.toggle_bass_boost();
            }
            ControlEvent::FadeIn => self.controller.fade_in(),
            ControlEvent::FadeOut => self.controller.fade_out(),
            ControlEvent::ModeSelected(mode) => {
                self.mode = mode;
                info!("Visualizer mode: {}", mode.name());
            }
            ControlEvent::FocusSelected(focus) => {
                self.focus = focus;
                if let Some(text) = focus.description() {
                    info!("{}", text);
                }
            }
            ControlEvent::FileSelected(None) => {}
            ControlEvent::FileSelected(Some(path)) => self.open(path),
        }
    }

    /// Decode `path`, load it and start playing
    ///
    /// Decode failures are reported and leave the current file untouched.
    fn open(&mut self, path: PathBuf) {
        match DecodedAudio::open(&path) {
            Ok(audio) => {
                let mut media = self.media.lock();
                media.load(audio.resampled(self.sample_rate_hz));
                media.play();
            }
            Err(e) => warn!("{}", e),
        }
    }

    /// One render-loop iteration: sample, draw, measure
    pub fn on_tick(&mut self, surface: &mut RenderSurface) -> FrameInfo {
        let snapshot = self.sampler.sample();
        visualizer::render(surface, &snapshot, self.mode, self.focus.accent_color());
        self.frame_info(&snapshot)
    }

    fn frame_info(&self, snapshot: &AnalysisSnapshot) -> FrameInfo {
        let metrics = AudioMetrics::from_snapshot(snapshot, self.sample_rate_hz, self.fft_size);
        let fading = self.controller.graph().lock().is_fading();
        let media = self.media.lock();
        FrameInfo {
            metrics,
            current_time: media.current_time(),
            duration: media.duration(),
            progress_percent: media.progress_percent(),
            buffered_percent: media.buffered_percent(),
            playing: media.is_playing(),
            bass_boost: self.controller.bass_boost_enabled(),
            fading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{GraphSettings, SignalGraph};
    use crate::media::MediaElement;
    use image::Rgba;

    const RATE: u32 = 8000;

    fn player() -> Player {
        let config = PlayerConfig::default();
        let media = MediaHandle::new(MediaElement::new());
        let graph = SignalGraph::initialize(
            media.clone(),
            GraphSettings {
                sample_rate_hz: RATE,
                channels: 2,
                analysis: config.analysis.clone(),
                effects: config.effects.clone(),
            },
        )
        .unwrap();
        Player::new(graph, media, &config)
    }

    fn tone(secs: f32) -> DecodedAudio {
        let frames = (secs * RATE as f32) as usize;
        let samples = (0..frames)
            .map(|i| (2.0 * std::f32::consts::PI * 500.0 * i as f32 / RATE as f32).sin() * 0.2)
            .collect();
        DecodedAudio::new(samples, 1, RATE)
    }

    #[test]
    fn test_first_tick_before_audio_is_silent() {
        let mut player = player();
        let mut surface = RenderSurface::new(256, 256, Rgba([0, 0, 0, 255]));

        let info = player.on_tick(&mut surface);
        assert_eq!(info.metrics, AudioMetrics::default());
        assert_eq!(info.duration, None);
        assert_eq!(info.progress_percent, None);
        assert!(surface.image().pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_events_update_state() {
        let mut player = player();

        player.handle(ControlEvent::ModeSelected(VisualizerMode::Waveform));
        assert_eq!(player.mode(), VisualizerMode::Waveform);

        player.handle(ControlEvent::FocusSelected(FocusMode::Frequency));
        assert_eq!(player.focus(), FocusMode::Frequency);

        player.handle(ControlEvent::VolumeChanged(0.25));
        assert_eq!(player.volume(), 0.25);
        assert_eq!(player.controller().graph().lock().gain(), 0.25);

        player.handle(ControlEvent::BassBoostToggled);
        assert!(player.bass_boost_enabled());

        player.handle(ControlEvent::FileSelected(None));
        assert!(!player.media().lock().is_loaded());
    }

    #[test]
    fn test_frame_info_reflects_bass_and_fades() {
        let mut player = player();
        let mut surface = RenderSurface::new(64, 64, Rgba([0, 0, 0, 255]));

        let info = player.on_tick(&mut surface);
        assert!(!info.bass_boost);
        assert!(!info.fading);

        player.handle(ControlEvent::BassBoostToggled);
        assert!(player.on_tick(&mut surface).bass_boost);

        player.handle(ControlEvent::FadeIn);
        assert!(player.on_tick(&mut surface).fading);

        // Run past the 3s ramp
        let mut block = vec![0.0f32; 2 * RATE as usize];
        for _ in 0..4 {
            player.controller().graph().process(&mut block);
        }
        let info = player.on_tick(&mut surface);
        assert!(!info.fading);
        assert!(info.bass_boost);

        player.handle(ControlEvent::BassBoostToggled);
        assert!(!player.on_tick(&mut surface).bass_boost);
    }

    #[test]
    fn test_readout_format() {
        let mut info = FrameInfo {
            metrics: AudioMetrics {
                amplitude_percent: 42.5,
                dominant_frequency_hz: 1722,
            },
            current_time: 83.9,
            duration: Some(200.0),
            progress_percent: Some(41.95),
            buffered_percent: Some(100.0),
            playing: true,
            bass_boost: true,
            fading: false,
        };
        assert_eq!(
            info.readout(VisualizerMode::Bars),
            "1:23 / 3:20 | amp 42.5% | 1722 Hz | bars | bass on"
        );

        info.bass_boost = false;
        info.fading = true;
        info.duration = None;
        assert_eq!(
            info.readout(VisualizerMode::Waveform),
            "1:23 / 0:00 | amp 42.5% | 1722 Hz | waveform | bass off | fading"
        );
    }

    #[test]
    fn test_nan_volume_is_recoverable() {
        let mut player = player();
        player.handle(ControlEvent::VolumeChanged(f32::NAN));
        assert_eq!(player.volume(), 0.0);
        assert_eq!(player.controller().graph().lock().gain(), 0.0);

        player.handle(ControlEvent::VolumeChanged(player.volume() + 0.1));
        assert!((player.volume() - 0.1).abs() < 1e-6);
        assert!((player.controller().graph().lock().gain() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_reported_not_fatal() {
        let mut player = player();
        player.handle(ControlEvent::FileSelected(Some(PathBuf::from(
            "/nonexistent/definitely-missing.wav",
        ))));
        assert!(!player.media().lock().is_loaded());
    }

    #[test]
    fn test_transport_events() {
        let mut player = player();
        player.media().lock().load(tone(2.0));

        player.handle(ControlEvent::Play);
        assert!(player.media().lock().is_playing());

        player.handle(ControlEvent::Seek(1.0));
        player.handle(ControlEvent::SeekBy(0.5));
        assert!((player.media().lock().current_time() - 1.5).abs() < 1e-9);

        player.handle(ControlEvent::Pause);
        assert!(!player.media().lock().is_playing());

        player.handle(ControlEvent::Stop);
        assert_eq!(player.media().lock().current_time(), 0.0);
    }

    #[test]
    fn test_tick_reflects_playing_audio() {
        let mut player = player();
        player.media().lock().load(tone(1.0));
        player.handle(ControlEvent::Play);

        // Run the audio clock for a quarter second
        let mut block = vec![0.0f32; RATE as usize / 2];
        player.controller().graph().process(&mut block);

        let mut surface = RenderSurface::new(256, 256, Rgba([0, 0, 0, 255]));
        let info = player.on_tick(&mut surface);

        assert!(info.playing);
        assert!((info.current_time - 0.25).abs() < 1e-9);
        assert_eq!(info.progress_percent, Some(25.0));
        assert_eq!(info.buffered_percent, Some(100.0));
        assert!(info.metrics.amplitude_percent > 0.0);
        // 500Hz lands in bin 16 at 31.25Hz per bin
        assert_eq!(info.metrics.dominant_frequency_hz, 500);
    }
}
