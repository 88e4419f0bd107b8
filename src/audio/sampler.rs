//! Per-tick frequency and time-domain snapshots from the analysis tap.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::analyser::AnalysisTap;
use crate::params::AnalysisConfig;

/// One tick's worth of analysis data, both sequences `fft_size / 2` long
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSnapshot {
    /// Byte-scaled magnitudes, lowest bin first
    pub frequency: Vec<u8>,

    /// Byte-scaled samples, 128 = silence
    pub waveform: Vec<u8>,
}

impl AnalysisSnapshot {
    /// All-zero snapshot (what an empty tap reports)
    pub fn zeroed(len: usize) -> Self {
        Self {
            frequency: vec![0; len],
            waveform: vec![0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.frequency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequency.is_empty()
    }
}

/// Pulls snapshots from an [`AnalysisTap`]
///
/// Holds its own FFT plan and smoothing state, so sampling never touches the
/// graph beyond a short copy out of the tap.
pub struct AnalysisSampler {
    tap: AnalysisTap,
    config: AnalysisConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl AnalysisSampler {
    pub fn new(tap: AnalysisTap, config: AnalysisConfig) -> Self {
        let fft_size = tap.fft_size();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            tap,
            fft,
            window: (0..fft_size).map(|i| blackman_window(i, fft_size)).collect(),
            time_domain: vec![0.0; fft_size],
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
            config,
        }
    }

    /// Number of elements in every snapshot
    pub fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    /// Take a snapshot of the tap's latest window
    pub fn sample(&mut self) -> AnalysisSnapshot {
        let bins = self.bin_count();
        if !self.tap.copy_latest(&mut self.time_domain) {
            return AnalysisSnapshot::zeroed(bins);
        }

        let waveform = self.time_domain[..bins]
            .iter()
            .map(|&x| (128.0 * (1.0 + x)).clamp(0.0, 255.0) as u8)
            .collect();

        AnalysisSnapshot {
            frequency: self.frequency_bytes(),
            waveform,
        }
    }

    fn frequency_bytes(&mut self) -> Vec<u8> {
        let fft_size = self.time_domain.len();

        // Apply Blackman window
        for ((out, &x), &w) in self
            .spectrum
            .iter_mut()
            .zip(&self.time_domain)
            .zip(&self.window)
        {
            *out = Complex::new(x * w, 0.0);
        }

        self.fft.process(&mut self.spectrum);

        let tau = self.config.smoothing_time_constant;
        let norm = 1.0 / fft_size as f32;
        let min_db = self.config.min_decibels;
        let db_range = self.config.max_decibels - min_db;

        self.smoothed
            .iter_mut()
            .zip(&self.spectrum)
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * norm;
                let value = tau * *smoothed + (1.0 - tau) * magnitude;
                *smoothed = if value.is_finite() { value } else { 0.0 };

                let db = 20.0 * smoothed.log10();
                let scaled = 255.0 * (db - min_db) / db_range;
                // -inf dB (exact silence) and NaN both land on 0
                if scaled.is_nan() {
                    0
                } else {
                    scaled.clamp(0.0, 255.0) as u8
                }
            })
            .collect()
    }
}

/// Blackman window as used by the browser analyser
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}
