//! Audioscope - listen to a file while watching its spectrum
//!
//! Bars show how loud each frequency band is, the waveform shows the raw
//! signal, and the title bar reads out amplitude and the dominant pitch.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use image::{Rgba, RgbaImage};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use audioscope::audio::{AudioOutput, GraphSettings, OutputDevice, SignalGraph};
use audioscope::cli::Args;
use audioscope::media::MediaHandle;
use audioscope::offline::{render_offline, SessionPlan};
use audioscope::params::{audio_constants::DEFAULT_SAMPLE_RATE_HZ, PlayerConfig};
use audioscope::player::{ControlEvent, Player};
use audioscope::rendering::RenderSystem;
use audioscope::visualizer::{
    draw_transport_strip, over_strip, strip_fraction, FocusMode, RenderSurface, VisualizerMode,
};

/// Seek step for the arrow keys (seconds)
const SEEK_STEP_S: f64 = 5.0;
/// Volume step for the arrow keys
const VOLUME_STEP: f32 = 0.1;
/// How often the title readout is refreshed
const TITLE_INTERVAL: Duration = Duration::from_millis(250);

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Playback
    player: Option<Player>,
    _output: Option<AudioOutput>,

    // Raster surfaces, composed into `frame` every tick
    visualizer: RenderSurface,
    strip: RenderSurface,
    frame: RgbaImage,

    // Configuration
    config: PlayerConfig,
    plan: SessionPlan,
    initial_file: Option<std::path::PathBuf>,

    // Pointer over the transport strip
    cursor: winit::dpi::PhysicalPosition<f64>,
    scrubbing: bool,

    last_title: Instant,
}

impl App {
    fn new(args: &Args, config: PlayerConfig) -> Self {
        let render = &config.render;
        let background = Rgba(render.background);

        Self {
            window: None,
            render_system: None,
            player: None,
            _output: None,
            visualizer: RenderSurface::new(render.width, render.height, background),
            strip: RenderSurface::new(render.width, render.strip_height, background),
            frame: RgbaImage::from_pixel(render.width, render.window_height(), background),
            plan: args.session_plan(&config),
            initial_file: args.file.clone(),
            config,
            cursor: winit::dpi::PhysicalPosition::new(0.0, 0.0),
            scrubbing: false,
            last_title: Instant::now(),
        }
    }

    /// Open the window, audio device and signal graph
    fn setup(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let render = &self.config.render;
        let window_attributes = Window::default_attributes()
            .with_title("Audioscope")
            .with_resizable(false)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                render.width,
                render.window_height(),
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            render.width,
            render.window_height(),
        ))
        .map_err(anyhow::Error::msg)?;

        let device = OutputDevice::open_default(DEFAULT_SAMPLE_RATE_HZ)?;
        let media = MediaHandle::default();
        let graph = SignalGraph::initialize(
            media.clone(),
            GraphSettings {
                sample_rate_hz: device.sample_rate_hz(),
                channels: device.channels(),
                analysis: self.config.analysis.clone(),
                effects: self.config.effects.clone(),
            },
        )?;
        let output = device.start(graph.clone())?;

        let mut player = Player::new(graph, media, &self.config);
        apply_plan(&mut player, &self.plan);
        player.handle(ControlEvent::FileSelected(self.initial_file.take()));

        info!("Space play/pause, S stop, arrows seek/volume, B bass, I/O fades, click the strip to seek");
        info!("1 bars, 2 waveform, A/F/N focus, ESC quit; drop an audio file to play it");

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.player = Some(player);
        self._output = Some(output);
        Ok(())
    }

    /// Translate a key press into a player event
    fn key_event(&self, key: KeyCode) -> Option<ControlEvent> {
        let player = self.player.as_ref()?;
        let event = match key {
            KeyCode::Space => {
                if player.media().lock().is_playing() {
                    ControlEvent::Pause
                } else {
                    ControlEvent::Play
                }
            }
            KeyCode::KeyS => ControlEvent::Stop,
            KeyCode::ArrowLeft => ControlEvent::SeekBy(-SEEK_STEP_S),
            KeyCode::ArrowRight => ControlEvent::SeekBy(SEEK_STEP_S),
            KeyCode::ArrowUp => ControlEvent::VolumeChanged(player.volume() + VOLUME_STEP),
            KeyCode::ArrowDown => ControlEvent::VolumeChanged(player.volume() - VOLUME_STEP),
            KeyCode::KeyB => ControlEvent::BassBoostToggled,
            KeyCode::KeyI => ControlEvent::FadeIn,
            KeyCode::KeyO => ControlEvent::FadeOut,
            KeyCode::Digit1 => ControlEvent::ModeSelected(VisualizerMode::Bars),
            KeyCode::Digit2 => ControlEvent::ModeSelected(VisualizerMode::Waveform),
            KeyCode::KeyA => ControlEvent::FocusSelected(FocusMode::Amplitude),
            KeyCode::KeyF => ControlEvent::FocusSelected(FocusMode::Frequency),
            KeyCode::KeyN => ControlEvent::FocusSelected(FocusMode::None),
            _ => return None,
        };
        Some(event)
    }
}

impl App {
    /// Seek to the strip position under the cursor
    fn scrub(&mut self) {
        let width = self.config.render.width;
        let Some(player) = self.player.as_mut() else {
            return;
        };
        let Some(duration) = player.media().lock().duration() else {
            return;
        };
        let target = strip_fraction(self.cursor.x, width) * duration;
        player.handle(ControlEvent::Seek(target));
    }
}

/// Apply command-line effects before the first file plays
fn apply_plan(player: &mut Player, plan: &SessionPlan) {
    player.handle(ControlEvent::VolumeChanged(plan.volume));
    if plan.bass_boost {
        player.handle(ControlEvent::BassBoostToggled);
    }
    player.handle(ControlEvent::ModeSelected(plan.mode));
    player.handle(ControlEvent::FocusSelected(plan.focus));
    if plan.fade_in {
        player.handle(ControlEvent::FadeIn);
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        if let Err(e) = self.setup(event_loop) {
            error!("Visualization unavailable: {:#}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => {
                if let Some(control) = self.key_event(key) {
                    if let Some(player) = self.player.as_mut() {
                        player.handle(control);
                    }
                }
            }
            WindowEvent::DroppedFile(path) => {
                if let Some(player) = self.player.as_mut() {
                    player.handle(ControlEvent::FileSelected(Some(path)));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                if self.scrubbing {
                    self.scrub();
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let render = &self.config.render;
                if state == ElementState::Pressed
                    && over_strip(self.cursor.y, render.height, render.strip_height)
                {
                    self.scrubbing = true;
                    self.scrub();
                } else if state == ElementState::Released {
                    self.scrubbing = false;
                }
            }
            WindowEvent::Resized(size) => {
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    /// Render a single frame
    fn render_frame(&mut self) {
        let Some(ref mut player) = self.player else {
            return;
        };
        let Some(ref mut render_system) = self.render_system else {
            return;
        };

        let info = player.on_tick(&mut self.visualizer);
        draw_transport_strip(&mut self.strip, info.progress_percent, info.buffered_percent);

        image::imageops::replace(&mut self.frame, self.visualizer.image(), 0, 0);
        image::imageops::replace(
            &mut self.frame,
            self.strip.image(),
            0,
            self.visualizer.height() as i64,
        );
        render_system.upload_frame(&self.frame);

        match render_system.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    render_system.resize(size.width, size.height);
                }
            }
            Err(e) => warn!("Render error: {:?}", e),
        }

        if self.last_title.elapsed() >= TITLE_INTERVAL {
            if let Some(window) = &self.window {
                window.set_title(&info.readout(player.mode()));
            }
            self.last_title = Instant::now();
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = args.load_config()?;

    if let Some(recording) = args.create_recording_config() {
        let file = args
            .file
            .as_deref()
            .context("--record needs a FILE to render")?;
        let summary = render_offline(file, &config, &recording, &args.session_plan(&config))?;
        info!(
            "Wrote {} frames and {} audio frames to {} (peak amplitude {:.1}%)",
            summary.frames_written,
            summary.audio_frames_written,
            recording.output_dir,
            summary.peak_amplitude_percent
        );
        return Ok(());
    }

    let mut app = App::new(&args, config);
    let event_loop = EventLoop::new()?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
