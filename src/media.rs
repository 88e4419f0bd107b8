//! Media element: decoded audio plus transport state.
//!
//! Plays the role of the host's media element. The signal graph's source
//! node pulls frames from it on the audio thread while the UI thread drives
//! play/pause/seek and reads time for the readouts.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::error::PlayerError;

/// Interleaved PCM decoded from a file
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        let channels = channels.max(1);
        let mut samples = samples;
        // Drop a trailing partial frame
        samples.truncate(samples.len() - samples.len() % channels as usize);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Decode any container/codec symphonia can probe into normalized f32 samples
    ///
    /// The file extension is only a hint; the format is probed from content.
    pub fn open(path: &Path) -> Result<Self, PlayerError> {
        let decode_err = |source| PlayerError::Decode {
            path: path.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(path).map_err(|e| decode_err(SymphoniaError::IoError(e)))?;
        let stream = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                stream,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(decode_err)?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| decode_err(SymphoniaError::Unsupported("no audio track")))?;
        let track_id = track.id;
        let mut channels = track.codec_params.channels.map_or(0, |c| c.count());
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(decode_err)?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(decode_err(e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt packet: skip it and keep going
                Err(SymphoniaError::DecodeError(msg)) => {
                    warn!("Skipping bad packet in {}: {}", path.display(), msg);
                    continue;
                }
                Err(e) => return Err(decode_err(e)),
            };

            let spec = *decoded.spec();
            channels = spec.channels.count();
            sample_rate = spec.rate;

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        if channels == 0 || sample_rate == 0 {
            return Err(decode_err(SymphoniaError::Unsupported(
                "unknown channel layout or sample rate",
            )));
        }

        let audio = Self::new(samples, channels as u16, sample_rate);
        info!(
            "Decoded {}: {} ch @ {}Hz, {:.1}s",
            path.display(),
            audio.channels,
            audio.sample_rate,
            audio.duration_secs()
        );
        Ok(audio)
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Sample for `channel` of `frame`
    fn sample(&self, frame: usize, channel: usize) -> f32 {
        self.samples[frame * self.channels as usize + channel]
    }

    /// Linearly resample to `target_rate`
    ///
    /// The graph runs at the output device rate; files at other rates are
    /// converted once at load time.
    pub fn resampled(self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate || self.sample_rate == 0 || self.frames() == 0 {
            return self;
        }

        let ratio = self.sample_rate as f64 / target_rate as f64;
        let out_frames = (self.frames() as f64 / ratio).floor() as usize;
        let channels = self.channels as usize;
        let last = self.frames() - 1;

        let mut samples = Vec::with_capacity(out_frames * channels);
        for j in 0..out_frames {
            let pos = j as f64 * ratio;
            let i0 = (pos.floor() as usize).min(last);
            let i1 = (i0 + 1).min(last);
            let frac = (pos - i0 as f64) as f32;
            for ch in 0..channels {
                let a = self.sample(i0, ch);
                let b = self.sample(i1, ch);
                samples.push(a + (b - a) * frac);
            }
        }

        debug!(
            "Resampled {}Hz -> {}Hz ({} -> {} frames)",
            self.sample_rate,
            target_rate,
            self.frames(),
            out_frames
        );
        Self::new(samples, self.channels, target_rate)
    }
}

/// Transport over an optional loaded file
#[derive(Debug, Default)]
pub struct MediaElement {
    audio: Option<DecodedAudio>,
    position: usize,
    playing: bool,
}

impl MediaElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current file and rewind (does not start playback)
    pub fn load(&mut self, audio: DecodedAudio) {
        self.audio = Some(audio);
        self.position = 0;
        self.playing = false;
    }

    pub fn is_loaded(&self) -> bool {
        self.audio.is_some()
    }

    pub fn play(&mut self) {
        if let Some(audio) = &self.audio {
            // Restart from the top once the end was reached
            if self.position >= audio.frames() {
                self.position = 0;
            }
            self.playing = audio.frames() > 0;
        }
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Pause and rewind to the start
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Move the play head, clamped to [0, duration]
    pub fn seek(&mut self, secs: f64) {
        let Some(audio) = &self.audio else {
            return;
        };
        if !secs.is_finite() {
            return;
        }
        let frame = (secs.max(0.0) * audio.sample_rate() as f64).round() as usize;
        self.position = frame.min(audio.frames());
    }

    /// Play head in seconds
    pub fn current_time(&self) -> f64 {
        match &self.audio {
            Some(audio) if audio.sample_rate() > 0 => {
                self.position as f64 / audio.sample_rate() as f64
            }
            _ => 0.0,
        }
    }

    /// Duration in seconds; `None` until a non-empty file is loaded
    pub fn duration(&self) -> Option<f64> {
        self.audio
            .as_ref()
            .map(DecodedAudio::duration_secs)
            .filter(|d| *d > 0.0)
    }

    /// End of the buffered range in seconds
    ///
    /// Files are decoded up front, so once loaded everything is buffered.
    pub fn buffered_end(&self) -> f64 {
        self.duration().unwrap_or(0.0)
    }

    /// Played fraction as a percentage, guarded against unknown duration
    pub fn progress_percent(&self) -> Option<f32> {
        self.duration()
            .map(|d| ((self.current_time() / d) * 100.0).clamp(0.0, 100.0) as f32)
    }

    /// Buffered fraction as a percentage, guarded against unknown duration
    pub fn buffered_percent(&self) -> Option<f32> {
        self.duration()
            .map(|d| ((self.buffered_end() / d) * 100.0).clamp(0.0, 100.0) as f32)
    }

    /// Fill interleaved `out` (with `channels` channels) from the play head
    ///
    /// Writes silence while paused, unloaded or past the end. Source channels
    /// are mapped round-robin onto output channels (mono goes to every one).
    pub fn read_into(&mut self, out: &mut [f32], channels: usize) {
        out.fill(0.0);
        if !self.playing || channels == 0 {
            return;
        }
        let Some(audio) = &self.audio else {
            return;
        };

        let src_channels = audio.channels() as usize;
        let frames = out.len() / channels;
        let available = audio.frames().saturating_sub(self.position);
        let count = frames.min(available);

        for (i, frame) in out.chunks_exact_mut(channels).take(count).enumerate() {
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = audio.sample(self.position + i, ch % src_channels);
            }
        }

        self.position += count;
        if self.position >= audio.frames() {
            self.playing = false;
            debug!("Playback reached end of file");
        }
    }
}

/// Shared handle to the media element (UI thread + audio thread)
#[derive(Clone, Default)]
pub struct MediaHandle(Arc<Mutex<MediaElement>>);

impl MediaHandle {
    pub fn new(media: MediaElement) -> Self {
        Self(Arc::new(Mutex::new(media)))
    }

    pub fn lock(&self) -> MutexGuard<'_, MediaElement> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Format seconds as `m:ss`
pub fn format_time(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "0:00".to_string();
    }
    let total = secs.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
