//! User-driven parameter changes applied onto the signal graph.

use std::time::Duration;

use tracing::info;

use crate::audio::GraphHandle;
use crate::params::EffectsConfig;

/// Volume, bass boost and fades
///
/// Sole writer of the graph's gain and filter parameters.
pub struct ParameterController {
    graph: GraphHandle,
    effects: EffectsConfig,
    bass_on: bool,
}

impl ParameterController {
    pub fn new(graph: GraphHandle, effects: EffectsConfig) -> Self {
        Self {
            graph,
            effects,
            bass_on: false,
        }
    }

    pub fn graph(&self) -> &GraphHandle {
        &self.graph
    }

    pub fn bass_boost_enabled(&self) -> bool {
        self.bass_on
    }

    fn fade_duration(&self) -> Duration {
        Duration::from_secs_f32(self.effects.fade_duration_s)
    }

    /// Apply a volume level immediately (no ramp)
    pub fn set_volume(&mut self, level: f32) {
        self.graph.set_gain(level);
    }

    /// Flip bass boost; returns the new state
    pub fn toggle_bass_boost(&mut self) -> bool {
        self.bass_on = !self.bass_on;
        let db = if self.bass_on {
            self.effects.bass_boost_db
        } else {
            0.0
        };
        self.graph.set_filter_gain(db);
        info!("Bass boost {}", if self.bass_on { "on" } else { "off" });
        self.bass_on
    }

    /// Ramp from silence up to full level
    ///
    /// Always restarts from zero, even over a fade-out in flight.
    pub fn fade_in(&mut self) {
        let duration = self.fade_duration();
        let mut graph = self.graph.lock();
        graph.set_gain(0.0);
        graph.schedule_ramp(1.0, duration);
        info!("Fade in over {:.1}s", duration.as_secs_f32());
    }

    /// Ramp from the live level down to silence
    pub fn fade_out(&mut self) {
        let duration = self.fade_duration();
        self.graph.schedule_ramp(0.0, duration);
        info!("Fade out over {:.1}s", duration.as_secs_f32());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{GraphSettings, SignalGraph};
    use crate::media::MediaHandle;
    use crate::params::AnalysisConfig;

    const RATE: u32 = 1000;

    fn controller() -> ParameterController {
        let effects = EffectsConfig::default();
        let graph = SignalGraph::initialize(
            MediaHandle::default(),
            GraphSettings {
                sample_rate_hz: RATE,
                channels: 1,
                analysis: AnalysisConfig::default(),
                effects: effects.clone(),
            },
        )
        .unwrap();
        ParameterController::new(graph, effects)
    }

    /// Run the audio clock forward
    fn advance(controller: &ParameterController, secs: f32) {
        let mut block = vec![0.0f32; (secs * RATE as f32) as usize];
        controller.graph().process(&mut block);
    }

    fn gain(controller: &ParameterController) -> f32 {
        controller.graph().lock().gain()
    }

    #[test]
    fn test_set_volume_is_immediate() {
        let mut controller = controller();
        for v in [0.0, 0.1, 0.5, 0.73, 1.0] {
            controller.set_volume(v);
            assert_eq!(gain(&controller), v);
        }
    }

    #[test]
    fn test_fade_in_starts_from_silence() {
        let mut controller = controller();
        controller.set_volume(0.7);

        controller.fade_in();
        assert_eq!(gain(&controller), 0.0);

        advance(&controller, 1.5);
        assert!((gain(&controller) - 0.5).abs() < 1e-3);

        advance(&controller, 1.5);
        assert!((gain(&controller) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fade_out_starts_from_live_level() {
        let mut controller = controller();
        controller.set_volume(0.6);

        controller.fade_out();
        assert!((gain(&controller) - 0.6).abs() < 1e-6);

        advance(&controller, 1.5);
        assert!((gain(&controller) - 0.3).abs() < 1e-3);

        advance(&controller, 1.5);
        assert!(gain(&controller).abs() < 1e-6);
    }

    #[test]
    fn test_fade_in_interrupts_fade_out() {
        let mut controller = controller();
        controller.fade_out();
        advance(&controller, 1.0);
        assert!(gain(&controller) > 0.5);

        controller.fade_in();
        assert_eq!(gain(&controller), 0.0);
    }

    #[test]
    fn test_fade_out_takes_over_mid_fade_in() {
        let mut controller = controller();
        controller.fade_in();
        advance(&controller, 1.5);

        controller.fade_out();
        assert!((gain(&controller) - 0.5).abs() < 1e-3);
        advance(&controller, 3.0);
        assert!(gain(&controller).abs() < 1e-6);
    }

    #[test]
    fn test_volume_cancels_fade() {
        let mut controller = controller();
        controller.fade_in();
        advance(&controller, 1.0);
        controller.set_volume(0.4);
        advance(&controller, 3.0);
        assert_eq!(gain(&controller), 0.4);
    }

    #[test]
    fn test_double_toggle_restores_filter_gain() {
        let mut controller = controller();
        assert_eq!(controller.graph().lock().filter_gain_db(), 0.0);

        assert!(controller.toggle_bass_boost());
        assert_eq!(controller.graph().lock().filter_gain_db(), 15.0);

        assert!(!controller.toggle_bass_boost());
        assert_eq!(controller.graph().lock().filter_gain_db(), 0.0);
        assert!(!controller.bass_boost_enabled());
    }
}
