//! Output device: the audio clock that drives the signal graph.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use tracing::{error, info, warn};

use super::graph::GraphHandle;
use crate::error::PlayerError;

/// Default output device and the stream format chosen for it
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: SampleFormat,
}

impl OutputDevice {
    /// Open the default output device, preferring `preferred_rate_hz`
    ///
    /// Falls back to the device's default format when the preferred rate
    /// isn't offered as f32; that format must be one the stream can convert to.
    pub fn open_default(preferred_rate_hz: u32) -> Result<Self, PlayerError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlayerError::AudioUnavailable("no audio output device found".into()))?;

        let preferred = device
            .supported_output_configs()
            .map_err(|e| PlayerError::AudioUnavailable(format!("failed to query device: {}", e)))?
            .find(|range| {
                range.sample_format() == SampleFormat::F32
                    && range.min_sample_rate().0 <= preferred_rate_hz
                    && range.max_sample_rate().0 >= preferred_rate_hz
            })
            .map(|range| range.with_sample_rate(cpal::SampleRate(preferred_rate_hz)));

        let supported = match preferred {
            Some(config) => config,
            None => {
                let config = device.default_output_config().map_err(|e| {
                    PlayerError::AudioUnavailable(format!("failed to get audio config: {}", e))
                })?;
                warn!(
                    "Device doesn't offer f32 @ {}Hz, using {:?} @ {}Hz",
                    preferred_rate_hz,
                    config.sample_format(),
                    config.sample_rate().0
                );
                config
            }
        };
        let sample_format = check_sample_format(supported.sample_format())?;

        info!(
            "Audio: {} @ {}Hz, {} ch, {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            supported.sample_rate().0,
            supported.channels(),
            sample_format
        );

        Ok(Self {
            device,
            config: supported.into(),
            sample_format,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> usize {
        self.config.channels as usize
    }

    /// Start pulling blocks through `graph`
    pub fn start(self, graph: GraphHandle) -> Result<AudioOutput, PlayerError> {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(graph),
            SampleFormat::I16 => self.build_stream::<i16>(graph),
            SampleFormat::U16 => self.build_stream::<u16>(graph),
            SampleFormat::I32 => self.build_stream::<i32>(graph),
            other => Err(unsupported_format(other)),
        }?;

        stream.play().map_err(|e| {
            PlayerError::AudioUnavailable(format!("failed to start audio stream: {}", e))
        })?;

        Ok(AudioOutput { _stream: stream })
    }

    /// Run the graph in f32 and convert into the device's sample type
    fn build_stream<T>(&self, graph: GraphHandle) -> Result<cpal::Stream, PlayerError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let mut scratch: Vec<f32> = Vec::new();
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    graph.process(&mut scratch);
                    for (out, &sample) in data.iter_mut().zip(&scratch) {
                        *out = T::from_sample(sample);
                    }
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| {
                PlayerError::AudioUnavailable(format!("failed to build audio stream: {}", e))
            })
    }
}

/// Sample formats the output stream can convert into
fn check_sample_format(format: SampleFormat) -> Result<SampleFormat, PlayerError> {
    match format {
        SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16 | SampleFormat::I32 => {
            Ok(format)
        }
        other => Err(unsupported_format(other)),
    }
}

fn unsupported_format(format: SampleFormat) -> PlayerError {
    PlayerError::AudioUnavailable(format!(
        "device only offers {:?} samples, which the output stream can't produce",
        format
    ))
}

/// Running output stream
pub struct AudioOutput {
    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_sample_formats_are_accepted() {
        for format in [
            SampleFormat::F32,
            SampleFormat::I16,
            SampleFormat::U16,
            SampleFormat::I32,
        ] {
            assert_eq!(check_sample_format(format).unwrap(), format);
        }
    }

    #[test]
    fn test_unconvertible_format_names_the_format() {
        let err = check_sample_format(SampleFormat::U8).unwrap_err();
        assert!(matches!(err, PlayerError::AudioUnavailable(_)));
        assert!(err.to_string().contains("U8"));
    }
}
