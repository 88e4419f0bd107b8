//! Bar-spectrum and waveform drawing onto a raster surface.

use image::{Rgba, RgbaImage};

use crate::audio::AnalysisSnapshot;

/// Gap between neighbouring bars (pixels)
const BAR_GAP_PX: f32 = 2.0;

/// Played portion of the transport strip
const STRIP_PLAYED: Rgba<u8> = Rgba([0x4C, 0x8D, 0xFF, 0xFF]);
/// Buffered but not yet played
const STRIP_BUFFERED: Rgba<u8> = Rgba([0x5A, 0x5A, 0x5A, 0xFF]);
/// Empty track
const STRIP_TRACK: Rgba<u8> = Rgba([0x3D, 0x3D, 0x3D, 0xFF]);

/// What the visualizer draws each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisualizerMode {
    #[default]
    Bars,
    Waveform,
}

impl VisualizerMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bars => "bars",
            Self::Waveform => "waveform",
        }
    }
}

/// Which readout the user is studying; only changes the accent colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FocusMode {
    #[default]
    None,
    Amplitude,
    Frequency,
}

impl FocusMode {
    pub fn accent_color(self) -> Rgba<u8> {
        match self {
            Self::Amplitude => Rgba([0x00, 0xFF, 0x88, 0xFF]),
            Self::Frequency => Rgba([0xFF, 0xD8, 0x4D, 0xFF]),
            Self::None => Rgba([0x4C, 0x8D, 0xFF, 0xFF]),
        }
    }

    /// Short explanation shown when the focus is selected
    pub fn description(self) -> Option<&'static str> {
        match self {
            Self::Amplitude => Some(
                "Amplitude is the energy of the sound wave. \
                 The higher the wave's peaks, the louder the sound.",
            ),
            Self::Frequency => Some(
                "Frequency is the number of vibrations per second. \
                 The tighter the waves, the higher the pitch.",
            ),
            Self::None => None,
        }
    }
}

/// Fixed-size RGBA canvas, cleared and redrawn every tick
pub struct RenderSurface {
    pixels: RgbaImage,
    background: Rgba<u8>,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, background),
            background,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn clear(&mut self) {
        let background = self.background;
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
    }

    /// Fill the pixels whose centres fall inside `[x0, x1) × [y0, y1)`
    fn fill_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgba<u8>) {
        let (w, h) = (self.width(), self.height());
        let cols = centre_span(x0, x1, w);
        let rows = centre_span(y0, y1, h);
        for y in rows {
            for x in cols.clone() {
                self.pixels.put_pixel(x, y, color);
            }
        }
    }

    /// Put a pixel, ignoring coordinates off the surface
    fn plot(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && x < self.width() as i64 && y < self.height() as i64 {
            self.pixels.put_pixel(x as u32, y as u32, color);
        }
    }

    /// 1 px Bresenham line between two pixel positions
    fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgba<u8>) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;

        loop {
            self.plot(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
}

/// Pixel indices in `0..limit` whose centre lies in `[start, end)`
fn centre_span(start: f32, end: f32, limit: u32) -> std::ops::Range<u32> {
    let first = (start - 0.5).ceil().max(0.0) as u32;
    let last = ((end - 0.5).ceil().max(0.0) as u32).min(limit);
    first.min(last)..last
}

/// Clear `surface` and draw `snapshot` in `mode`
///
/// A zero-sized surface is only cleared.
pub fn render(
    surface: &mut RenderSurface,
    snapshot: &AnalysisSnapshot,
    mode: VisualizerMode,
    accent: Rgba<u8>,
) {
    surface.clear();
    if surface.width() == 0 || surface.height() == 0 || snapshot.is_empty() {
        return;
    }

    match mode {
        VisualizerMode::Bars => draw_bars(surface, &snapshot.frequency, accent),
        VisualizerMode::Waveform => draw_waveform(surface, &snapshot.waveform, accent),
    }
}

/// One bottom-anchored bar per bin, height = byte value in pixels
fn draw_bars(surface: &mut RenderSurface, bins: &[u8], color: Rgba<u8>) {
    let height = surface.height() as f32;
    let slot = surface.width() as f32 / bins.len() as f32;
    let bar_width = (slot - BAR_GAP_PX).max(1.0);

    for (i, &value) in bins.iter().enumerate() {
        if value == 0 {
            continue;
        }
        let x = i as f32 * slot;
        surface.fill_rect(x, height - value as f32, x + bar_width, height, color);
    }
}

/// Polyline through every sample, 128 on the vertical midline
fn draw_waveform(surface: &mut RenderSurface, samples: &[u8], color: Rgba<u8>) {
    let height = surface.height() as f32;
    let slice = surface.width() as f32 / samples.len() as f32;
    let max_row = surface.height() as i64 - 1;

    let point = |i: usize, value: u8| {
        let x = (i as f32 * slice).floor() as i64;
        let y = (value as f32 / 128.0 * height / 2.0).floor() as i64;
        (x, y.clamp(0, max_row))
    };

    let Some(&first) = samples.first() else {
        return;
    };
    let mut prev = point(0, first);
    surface.plot(prev.0, prev.1, color);
    for (i, &value) in samples.iter().enumerate().skip(1) {
        let next = point(i, value);
        surface.line(prev, next, color);
        prev = next;
    }
}

/// Progress and buffer bar across the whole surface
///
/// `None` (unknown duration) leaves just the empty track.
pub fn draw_transport_strip(
    surface: &mut RenderSurface,
    progress_percent: Option<f32>,
    buffered_percent: Option<f32>,
) {
    let (w, h) = (surface.width() as f32, surface.height() as f32);
    surface.fill_rect(0.0, 0.0, w, h, STRIP_TRACK);

    if let Some(buffered) = buffered_percent {
        surface.fill_rect(0.0, 0.0, w * buffered / 100.0, h, STRIP_BUFFERED);
    }
    if let Some(progress) = progress_percent {
        surface.fill_rect(0.0, 0.0, w * progress / 100.0, h, STRIP_PLAYED);
    }
}

/// Fraction along a strip `width` px wide at window column `x`, clamped to [0, 1]
pub fn strip_fraction(x: f64, width: u32) -> f64 {
    if width == 0 || !x.is_finite() {
        return 0.0;
    }
    (x / width as f64).clamp(0.0, 1.0)
}

/// Whether window row `y` falls on a strip spanning `top..top + height`
pub fn over_strip(y: f64, top: u32, height: u32) -> bool {
    y >= top as f64 && y < (top + height) as f64
}
