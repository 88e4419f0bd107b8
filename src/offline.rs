//! Headless recording: run the whole pipeline on a synthetic clock.
//!
//! Writes the processed audio to WAV and one PNG per visualizer frame, so a
//! session can be reviewed (or turned into a video) without an output device.

use std::path::Path;

use image::Rgba;
use tracing::info;

use crate::audio::{AudioMetrics, GraphSettings, SignalGraph};
use crate::error::PlayerError;
use crate::media::{DecodedAudio, MediaElement, MediaHandle};
use crate::params::{audio_constants::BLOCK_SIZE, PlayerConfig, RecordingConfig};
use crate::player::{ControlEvent, Player};
use crate::visualizer::{FocusMode, RenderSurface, VisualizerMode};

/// Effects and view settings applied during an offline render
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub volume: f32,
    pub bass_boost: bool,
    /// Start with a fade-in from silence
    pub fade_in: bool,
    /// Trigger a fade-out at this time (seconds)
    pub fade_out_at: Option<f32>,
    pub mode: VisualizerMode,
    pub focus: FocusMode,
}

impl Default for SessionPlan {
    fn default() -> Self {
        Self {
            volume: 1.0,
            bass_boost: false,
            fade_in: false,
            fade_out_at: None,
            mode: VisualizerMode::Bars,
            focus: FocusMode::None,
        }
    }
}

/// What an offline render produced
#[derive(Debug, Clone)]
pub struct RecordingSummary {
    pub frames_written: usize,
    pub audio_frames_written: usize,
    /// Loudest amplitude readout seen
    pub peak_amplitude_percent: f32,
}

/// Render `file` through the player into `recording.output_dir`
///
/// Stops at `recording.duration_secs` or the end of the file, whichever
/// comes first.
pub fn render_offline(
    file: &Path,
    config: &PlayerConfig,
    recording: &RecordingConfig,
    plan: &SessionPlan,
) -> Result<RecordingSummary, PlayerError> {
    if recording.fps == 0 {
        return Err(PlayerError::InvalidConfig("fps must be > 0".into()));
    }

    let audio = DecodedAudio::open(file)?;
    let sample_rate_hz = audio.sample_rate();
    let channels = audio.channels() as usize;
    let total_frames = recording
        .total_frames()
        .min((audio.duration_secs() * recording.fps as f64).ceil() as usize);

    std::fs::create_dir_all(recording.frames_dir())?;

    let media = MediaHandle::new(MediaElement::new());
    media.lock().load(audio);

    let graph = SignalGraph::initialize(
        media.clone(),
        GraphSettings {
            sample_rate_hz,
            channels,
            analysis: config.analysis.clone(),
            effects: config.effects.clone(),
        },
    )?;
    let mut player = Player::new(graph.clone(), media, config);

    player.handle(ControlEvent::VolumeChanged(plan.volume));
    if plan.bass_boost {
        player.handle(ControlEvent::BassBoostToggled);
    }
    player.handle(ControlEvent::ModeSelected(plan.mode));
    player.handle(ControlEvent::FocusSelected(plan.focus));
    if plan.fade_in {
        player.handle(ControlEvent::FadeIn);
    }
    player.handle(ControlEvent::Play);

    let spec = hound::WavSpec {
        channels: channels as u16,
        sample_rate: sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(recording.audio_path(), spec)?;

    let background = Rgba(config.render.background);
    let mut surface = RenderSurface::new(config.render.width, config.render.height, background);
    let mut block = vec![0.0f32; BLOCK_SIZE * channels];
    let mut fade_out_pending = plan.fade_out_at;
    let mut audio_frames = 0usize;
    let mut peak = AudioMetrics::default();

    info!(
        "Recording {} frames @ {} fps into {}",
        total_frames, recording.fps, recording.output_dir
    );

    for frame_num in 0..total_frames {
        let tick_time = frame_num as f64 / recording.fps as f64;
        if let Some(at) = fade_out_pending {
            if tick_time >= at as f64 {
                player.handle(ControlEvent::FadeOut);
                fade_out_pending = None;
            }
        }

        // Advance the audio clock to the end of this tick
        let target =
            ((frame_num + 1) as f64 * sample_rate_hz as f64 / recording.fps as f64).round() as usize;
        while audio_frames < target {
            let frames = (target - audio_frames).min(BLOCK_SIZE);
            let out = &mut block[..frames * channels];
            graph.process(out);
            for &sample in out.iter() {
                writer.write_sample(sample)?;
            }
            audio_frames += frames;
        }

        let info = player.on_tick(&mut surface);
        if info.metrics.amplitude_percent > peak.amplitude_percent {
            peak = info.metrics;
        }

        let frame_path = format!("{}/frame_{:05}.png", recording.frames_dir(), frame_num);
        surface.image().save(&frame_path)?;
    }

    writer.finalize()?;
    info!(
        "Recorded {} frames, {:.2}s of audio",
        total_frames,
        audio_frames as f64 / sample_rate_hz as f64
    );

    Ok(RecordingSummary {
        frames_written: total_frames,
        audio_frames_written: audio_frames,
        peak_amplitude_percent: peak.amplitude_percent,
    })
}
