//! Rendering and recording configuration.

use serde::Deserialize;

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Visualizer surface width (pixels)
    pub width: u32,

    /// Visualizer surface height (pixels)
    /// Bars map byte values 1:1 to pixels, so anything under 255 clips
    pub height: u32,

    /// Height of the progress/buffer strip below the visualizer (pixels)
    pub strip_height: u32,

    /// Clear color, RGBA
    pub background: [u8; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 300,
            strip_height: 12,
            background: [0x12, 0x12, 0x12, 0xFF],
        }
    }
}

impl RenderConfig {
    /// Window height including the transport strip
    pub fn window_height(&self) -> u32 {
        self.height + self.strip_height
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!(
                "Surface must be non-empty, got {}x{}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: String,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: "recording".to_string(),
            fps: 60,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> String {
        format!("{}/frames", self.output_dir)
    }

    /// Audio file path
    pub fn audio_path(&self) -> String {
        format!("{}/audio.wav", self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_frame_count() {
        let config = RecordingConfig::new(1.01);
        assert_eq!(config.total_frames(), 61);
        assert_eq!(config.frames_dir(), "recording/frames");
        assert_eq!(config.audio_path(), "recording/audio.wav");
    }
}
