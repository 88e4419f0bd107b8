//! End-to-end checks through the public API, without an output device.

use image::Rgba;

use audioscope::audio::{AnalysisSampler, AudioMetrics, GraphSettings, SignalGraph};
use audioscope::controller::ParameterController;
use audioscope::media::{DecodedAudio, MediaElement, MediaHandle};
use audioscope::params::PlayerConfig;
use audioscope::visualizer::{render, FocusMode, RenderSurface, VisualizerMode};

const RATE: u32 = 8000;
const BG: Rgba<u8> = Rgba([0x12, 0x12, 0x12, 0xFF]);

fn sine(freq_hz: f32, amplitude: f32, secs: f32) -> DecodedAudio {
    let frames = (secs * RATE as f32) as usize;
    let samples = (0..frames)
        .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / RATE as f32).sin() * amplitude)
        .collect();
    DecodedAudio::new(samples, 1, RATE)
}

fn setup(audio: DecodedAudio) -> (ParameterController, AnalysisSampler, MediaHandle) {
    let config = PlayerConfig::default();
    let media = MediaHandle::new(MediaElement::new());
    media.lock().load(audio);
    media.lock().play();

    let graph = SignalGraph::initialize(
        media.clone(),
        GraphSettings {
            sample_rate_hz: RATE,
            channels: 1,
            analysis: config.analysis.clone(),
            effects: config.effects.clone(),
        },
    )
    .unwrap();
    let sampler = AnalysisSampler::new(graph.analysis_tap(), config.analysis.clone());
    let controller = ParameterController::new(graph, config.effects);
    (controller, sampler, media)
}

fn run(controller: &ParameterController, frames: usize) {
    let mut block = vec![0.0f32; 128];
    for _ in 0..frames / 128 {
        controller.graph().process(&mut block);
    }
}

#[test]
fn test_tone_shows_up_in_bars_and_metrics() {
    let (controller, mut sampler, _media) = setup(sine(1000.0, 0.1, 1.0));
    run(&controller, 2048);

    let snapshot = sampler.sample();
    let metrics = AudioMetrics::from_snapshot(&snapshot, RATE, 256);
    // 1000Hz at 31.25Hz per bin is bin 32
    assert_eq!(metrics.dominant_frequency_hz, 1000);
    assert!(metrics.amplitude_percent > 0.0);

    let mut surface = RenderSurface::new(512, 256, BG);
    render(
        &mut surface,
        &snapshot,
        VisualizerMode::Bars,
        FocusMode::Frequency.accent_color(),
    );
    // Bar 32 spans x in [128, 130) and is the tallest
    let accent = FocusMode::Frequency.accent_color();
    let column = |x: u32| (0..256).filter(|&y| surface.pixel(x, y) == accent).count();
    assert!(column(129) > 0);
    assert!(column(129) >= column(33));
}

#[test]
fn test_volume_zero_flattens_waveform() {
    let (mut controller, mut sampler, _media) = setup(sine(440.0, 0.5, 1.0));
    controller.set_volume(0.0);
    run(&controller, 1024);

    let snapshot = sampler.sample();
    assert!(snapshot.waveform.iter().all(|&b| b == 128));
    assert!(snapshot.frequency.iter().all(|&b| b == 0));

    let mut surface = RenderSurface::new(256, 256, BG);
    let accent = FocusMode::None.accent_color();
    render(&mut surface, &snapshot, VisualizerMode::Waveform, accent);
    // Flat line along the midline row, last point at x = 127 * 2
    assert!((0..=254).all(|x| surface.pixel(x, 128) == accent));
}

#[test]
fn test_fade_out_silences_then_fade_in_restores() {
    let (mut controller, _sampler, _media) = setup(sine(440.0, 0.5, 10.0));

    controller.fade_out();
    run(&controller, 3 * RATE as usize + 128);
    assert_eq!(controller.graph().lock().gain(), 0.0);

    controller.fade_in();
    assert_eq!(controller.graph().lock().gain(), 0.0);
    run(&controller, 3 * RATE as usize + 128);
    assert_eq!(controller.graph().lock().gain(), 1.0);
}

#[test]
fn test_playback_stops_at_end_of_file() {
    let (controller, _sampler, media) = setup(sine(440.0, 0.5, 0.25));
    run(&controller, RATE as usize / 2);

    let media = media.lock();
    assert!(!media.is_playing());
    assert_eq!(media.progress_percent(), Some(100.0));
}
