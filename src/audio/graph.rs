//! Fixed signal chain: source → low-shelf → gain → analyser → output.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F32};
use tracing::{debug, info, warn};

use super::analyser::AnalysisTap;
use super::gain::GainParam;
use crate::error::PlayerError;
use crate::media::MediaHandle;
use crate::params::{AnalysisConfig, EffectsConfig};

/// Everything the graph needs to know at construction
#[derive(Debug, Clone)]
pub struct GraphSettings {
    /// Rate of the audio clock driving the graph (Hz)
    pub sample_rate_hz: u32,

    /// Interleaved output channels
    pub channels: usize,

    pub analysis: AnalysisConfig,
    pub effects: EffectsConfig,
}

/// Live processing nodes
///
/// Wired once in [`SignalGraph::initialize`] and never rewired.
pub struct SignalGraph {
    source: MediaHandle,
    sample_rate_hz: u32,
    channels: usize,

    // Tone filter (one state per channel, shared coefficients)
    bass_cutoff_hz: f32,
    filter_gain_db: f32,
    filters: Vec<DirectForm2Transposed<f32>>,

    gain: GainParam,
    analyser: AnalysisTap,

    /// Frames processed so far (the graph's clock)
    clock: u64,

    /// Scratch for the analyser's mono downmix
    mono: Vec<f32>,
}

impl SignalGraph {
    /// Build the node chain over `source`
    ///
    /// All-or-nothing: any invalid setting aborts setup.
    pub fn initialize(
        source: MediaHandle,
        settings: GraphSettings,
    ) -> Result<GraphHandle, PlayerError> {
        if settings.sample_rate_hz == 0 || settings.channels == 0 {
            return Err(PlayerError::AudioUnavailable(format!(
                "unusable stream format: {} ch @ {}Hz",
                settings.channels, settings.sample_rate_hz
            )));
        }
        settings
            .analysis
            .validate()
            .and_then(|_| settings.effects.validate())
            .map_err(PlayerError::AudioUnavailable)?;

        let coeffs = low_shelf(
            settings.sample_rate_hz,
            settings.effects.bass_cutoff_hz,
            0.0,
        )
        .map_err(PlayerError::AudioUnavailable)?;

        let graph = Self {
            source,
            sample_rate_hz: settings.sample_rate_hz,
            channels: settings.channels,
            bass_cutoff_hz: settings.effects.bass_cutoff_hz,
            filter_gain_db: 0.0,
            filters: vec![DirectForm2Transposed::<f32>::new(coeffs); settings.channels],
            gain: GainParam::new(settings.effects.initial_volume),
            analyser: AnalysisTap::new(settings.analysis.fft_size),
            clock: 0,
            mono: Vec::new(),
        };

        info!(
            "Signal graph ready: {} ch @ {}Hz, low-shelf {}Hz, fft {}",
            settings.channels,
            settings.sample_rate_hz,
            settings.effects.bass_cutoff_hz,
            settings.analysis.fft_size
        );

        Ok(GraphHandle(Arc::new(Mutex::new(graph))))
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Graph clock in seconds
    pub fn current_time(&self) -> f64 {
        self.clock as f64 / self.sample_rate_hz as f64
    }

    /// Instantaneous gain level
    pub fn gain(&self) -> f32 {
        self.gain.value_at(self.clock)
    }

    /// Whether a gain ramp is still in flight
    pub fn is_fading(&self) -> bool {
        self.gain.is_ramping(self.clock)
    }

    pub fn filter_gain_db(&self) -> f32 {
        self.filter_gain_db
    }

    /// Set gain immediately, superseding any ramp
    pub fn set_gain(&mut self, level: f32) {
        self.gain.set(level);
        debug!("Gain set to {:.2}", self.gain());
    }

    /// Change the low-shelf gain, keeping filter state
    pub fn set_filter_gain(&mut self, db: f32) {
        match low_shelf(self.sample_rate_hz, self.bass_cutoff_hz, db) {
            Ok(coeffs) => {
                for filter in &mut self.filters {
                    filter.update_coefficients(coeffs);
                }
                self.filter_gain_db = db;
                debug!("Low-shelf gain set to {}dB", db);
            }
            Err(e) => warn!("Keeping previous low-shelf gain: {}", e),
        }
    }

    /// Ramp gain linearly from its current level to `target` over `from_now`
    pub fn schedule_ramp(&mut self, target: f32, from_now: Duration) {
        let frames = (from_now.as_secs_f64() * self.sample_rate_hz as f64).round() as u64;
        self.gain.ramp_to(target, self.clock, frames);
        debug!(
            "Gain ramp {:.2} -> {:.2} over {:.2}s",
            self.gain(),
            target,
            from_now.as_secs_f64()
        );
    }

    pub fn analysis_tap(&self) -> AnalysisTap {
        self.analyser.clone()
    }

    /// Pull one block through the chain into interleaved `out`
    pub fn process(&mut self, out: &mut [f32]) {
        let channels = self.channels;
        let frames = out.len() / channels;
        let out = &mut out[..frames * channels];

        // Source
        self.source.lock().read_into(out, channels);

        // Tone filter → gain, downmixing for the analyser as we go
        self.mono.clear();
        let scale = 1.0 / channels as f32;
        for (i, frame) in out.chunks_exact_mut(channels).enumerate() {
            let level = self.gain.value_at(self.clock + i as u64);
            let mut sum = 0.0;
            for (sample, filter) in frame.iter_mut().zip(&mut self.filters) {
                *sample = filter.run(*sample) * level;
                sum += *sample;
            }
            self.mono.push(sum * scale);
        }

        // Analyser passes the signal through untouched
        self.analyser.write(&self.mono);

        self.clock += frames as u64;
        self.gain.settle(self.clock);
    }
}

/// Low-shelf coefficients for the bass boost
fn low_shelf(sample_rate_hz: u32, cutoff_hz: f32, gain_db: f32) -> Result<Coefficients<f32>, String> {
    Coefficients::<f32>::from_params(
        Type::LowShelf(gain_db),
        (sample_rate_hz as f32).hz(),
        cutoff_hz.hz(),
        Q_BUTTERWORTH_F32,
    )
    .map_err(|e| {
        format!(
            "low-shelf {}Hz @ {}Hz rejected: {:?}",
            cutoff_hz, sample_rate_hz, e
        )
    })
}

/// Shared handle to the graph (audio callback + UI thread)
#[derive(Clone)]
pub struct GraphHandle(Arc<Mutex<SignalGraph>>);

impl GraphHandle {
    /// Lock the graph; compound parameter changes should happen under one lock
    pub fn lock(&self) -> MutexGuard<'_, SignalGraph> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_gain(&self, level: f32) {
        self.lock().set_gain(level);
    }

    pub fn set_filter_gain(&self, db: f32) {
        self.lock().set_filter_gain(db);
    }

    pub fn schedule_ramp(&self, target: f32, from_now: Duration) {
        self.lock().schedule_ramp(target, from_now);
    }

    pub fn analysis_tap(&self) -> AnalysisTap {
        self.lock().analysis_tap()
    }

    pub fn process(&self, out: &mut [f32]) {
        self.lock().process(out);
    }
}
