//! Display-only readouts derived from a frequency snapshot.

use super::sampler::AnalysisSnapshot;

/// Amplitude and dominant frequency estimates for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioMetrics {
    /// Mean bin magnitude as a percentage of full scale, one decimal
    pub amplitude_percent: f32,

    /// Centre of the strongest bin, floored to whole Hz
    pub dominant_frequency_hz: u32,
}

impl AudioMetrics {
    pub fn from_snapshot(snapshot: &AnalysisSnapshot, sample_rate_hz: u32, fft_size: usize) -> Self {
        let bins = &snapshot.frequency;
        if bins.is_empty() || fft_size == 0 {
            return Self::default();
        }

        let mean = bins.iter().map(|&b| b as f64).sum::<f64>() / bins.len() as f64;
        let amplitude_percent = ((mean / 255.0 * 100.0) * 10.0).round() / 10.0;

        // First index wins on ties
        let (peak, _) = bins
            .iter()
            .enumerate()
            .fold((0, 0u8), |best, (i, &b)| if b > best.1 { (i, b) } else { best });
        let dominant = peak as f64 * sample_rate_hz as f64 / fft_size as f64;

        Self {
            amplitude_percent: amplitude_percent as f32,
            dominant_frequency_hz: dominant.floor() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(frequency: Vec<u8>) -> AnalysisSnapshot {
        let waveform = vec![128; frequency.len()];
        AnalysisSnapshot {
            frequency,
            waveform,
        }
    }

    #[test]
    fn test_dominant_frequency_example() {
        let mut bins = vec![0u8; 128];
        bins[10] = 200;
        let metrics = AudioMetrics::from_snapshot(&snapshot(bins), 44100, 256);
        assert_eq!(metrics.dominant_frequency_hz, 1722);
    }

    #[test]
    fn test_single_bin_maps_to_floored_centre() {
        for k in [1usize, 3, 64, 127] {
            let mut bins = vec![0u8; 128];
            bins[k] = 1;
            let metrics = AudioMetrics::from_snapshot(&snapshot(bins), 48000, 256);
            let expected = (k as f64 * 48000.0 / 256.0).floor() as u32;
            assert_eq!(metrics.dominant_frequency_hz, expected);
        }
    }

    #[test]
    fn test_ties_pick_first_index() {
        let mut bins = vec![0u8; 128];
        bins[5] = 90;
        bins[7] = 90;
        let metrics = AudioMetrics::from_snapshot(&snapshot(bins), 44100, 256);
        assert_eq!(metrics.dominant_frequency_hz, (5.0f64 * 44100.0 / 256.0) as u32);
    }

    #[test]
    fn test_amplitude_percent() {
        let metrics = AudioMetrics::from_snapshot(&snapshot(vec![255; 128]), 44100, 256);
        assert_eq!(metrics.amplitude_percent, 100.0);

        // mean = 51 → 20.0%
        let metrics = AudioMetrics::from_snapshot(&snapshot(vec![51; 128]), 44100, 256);
        assert_eq!(metrics.amplitude_percent, 20.0);

        // mean = 100 → 39.2%
        let metrics = AudioMetrics::from_snapshot(&snapshot(vec![100; 128]), 44100, 256);
        assert!((metrics.amplitude_percent - 39.2).abs() < 1e-4);
    }

    #[test]
    fn test_silence_and_empty() {
        let metrics = AudioMetrics::from_snapshot(&AnalysisSnapshot::zeroed(128), 44100, 256);
        assert_eq!(metrics, AudioMetrics::default());

        let metrics = AudioMetrics::from_snapshot(&AnalysisSnapshot::zeroed(0), 44100, 256);
        assert_eq!(metrics, AudioMetrics::default());
    }
}
