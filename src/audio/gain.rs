//! Gain parameter with linear ramps on the graph's frame clock.

/// Linear ramp in flight
#[derive(Debug, Clone, Copy)]
struct Ramp {
    start_value: f32,
    target: f32,
    start_frame: u64,
    end_frame: u64,
}

/// Gain level in [0, 1] with at most one scheduled ramp
///
/// A new `set` or `ramp_to` supersedes a ramp in flight, taking over from
/// whatever level the old ramp had reached.
#[derive(Debug, Clone)]
pub struct GainParam {
    value: f32,
    ramp: Option<Ramp>,
}

impl GainParam {
    pub fn new(value: f32) -> Self {
        Self {
            value: clamp_level(value),
            ramp: None,
        }
    }

    /// Level at `frame` on the graph clock
    pub fn value_at(&self, frame: u64) -> f32 {
        match self.ramp {
            None => self.value,
            Some(ramp) if frame >= ramp.end_frame => ramp.target,
            Some(ramp) if frame <= ramp.start_frame => ramp.start_value,
            Some(ramp) => {
                let span = (ramp.end_frame - ramp.start_frame) as f64;
                let t = (frame - ramp.start_frame) as f64 / span;
                ramp.start_value + (ramp.target - ramp.start_value) * t as f32
            }
        }
    }

    /// Jump to `level` immediately, cancelling any ramp
    pub fn set(&mut self, level: f32) {
        self.value = clamp_level(level);
        self.ramp = None;
    }

    /// Ramp from the level at `now` to `target` over `duration_frames`
    pub fn ramp_to(&mut self, target: f32, now: u64, duration_frames: u64) {
        let target = clamp_level(target);
        if duration_frames == 0 {
            self.set(target);
            return;
        }
        let start_value = self.value_at(now);
        self.value = start_value;
        self.ramp = Some(Ramp {
            start_value,
            target,
            start_frame: now,
            end_frame: now + duration_frames,
        });
    }

    /// Whether a ramp is still running at `frame`
    pub fn is_ramping(&self, frame: u64) -> bool {
        self.ramp.is_some_and(|r| frame < r.end_frame)
    }

    /// Fold a finished ramp into the static value
    pub fn settle(&mut self, frame: u64) {
        if let Some(ramp) = self.ramp {
            if frame >= ramp.end_frame {
                self.value = ramp.target;
                self.ramp = None;
            }
        }
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
