//! AudioEngine - cpal-based full-duplex audio I/O
//!
//! Wires the platform audio device to the analysis pipeline:
//! - Input callback: takes channel 0 of captured frames and hands them to the
//!   analysis thread through the lock-free buffer pool (no allocation, locks,
//!   or blocking in the callback).
//! - Output callback: renders the probe tone from [`ToneGenerator`], driven
//!   by the shared [`ProbeControl`] atomics.
//!
//! Device sample-rate negotiation is out of scope; the engine uses the
//! device's default stream configuration and reports its rate to the caller.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::Arc;

use super::buffer_pool::AudioThreadChannels;
use super::tone::{ProbeControl, ToneGenerator};
use crate::error::AudioError;

pub struct AudioEngine {
    input_stream: Option<cpal::Stream>,
    output_stream: Option<cpal::Stream>,
    sample_rate: u32,
    probe: Arc<ProbeControl>,
    audio_channels: Option<AudioThreadChannels>,
}

impl AudioEngine {
    pub fn new(
        sample_rate: u32,
        probe: Arc<ProbeControl>,
        audio_channels: AudioThreadChannels,
    ) -> Self {
        AudioEngine {
            input_stream: None,
            output_stream: None,
            sample_rate,
            probe,
            audio_channels: Some(audio_channels),
        }
    }

    pub fn is_running(&self) -> bool {
        self.input_stream.is_some()
    }

    fn create_input_stream(
        &self,
        mut channels: AudioThreadChannels,
    ) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::StreamOpenFailed {
                reason: "No default input device found".to_string(),
            })?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to get default input config: {:?}", e),
            })?;

        let stream_config: cpal::StreamConfig = config.clone().into();
        let channels_count = stream_config.channels as usize;

        let err_fn = |err| tracing::error!("Input stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buffer) = channels.pool_consumer.pop() {
                        buffer.clear();
                        if channels_count == 1 {
                            buffer.extend_from_slice(data);
                        } else {
                            // De-interleave: take channel 0 only
                            for frame in data.chunks(channels_count) {
                                buffer.push(frame.first().copied().unwrap_or(0.0));
                            }
                        }
                        let _ = channels.data_producer.push(buffer);
                    }
                },
                err_fn,
                None,
            ),
            _ => {
                return Err(AudioError::StreamOpenFailed {
                    reason: "Only F32 sample format is currently supported for input".to_string(),
                })
            }
        }
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        Ok(stream)
    }

    fn create_output_stream(&self) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::StreamOpenFailed {
                reason: "No default output device found".to_string(),
            })?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Failed to get default output config: {:?}", e),
            })?;

        let stream_config: cpal::StreamConfig = config.clone().into();
        let channels_count = stream_config.channels as usize;

        let probe = Arc::clone(&self.probe);
        let mut generator = ToneGenerator::new(self.sample_rate);

        let err_fn = |err| tracing::error!("Output stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(channels_count) {
                        let sample = generator.next_sample(&probe);
                        for channel in frame.iter_mut() {
                            *channel = sample;
                        }
                    }
                },
                err_fn,
                None,
            ),
            _ => {
                return Err(AudioError::StreamOpenFailed {
                    reason: "Only F32 sample format is currently supported for output".to_string(),
                })
            }
        }
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("{:?}", e),
        })?;

        Ok(stream)
    }

    /// Open and start both streams.
    ///
    /// # Errors
    /// Returns `AlreadyRunning` if the engine is running, or a stream error
    /// if the device rejects the configuration.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.is_running() {
            return Err(AudioError::AlreadyRunning);
        }

        let audio_channels = self
            .audio_channels
            .take()
            .ok_or_else(|| AudioError::HardwareError {
                details: "Audio transfer channels already consumed".to_string(),
            })?;

        let input_stream = self.create_input_stream(audio_channels)?;
        let output_stream = self.create_output_stream()?;

        input_stream.play().map_err(|e| AudioError::HardwareError {
            details: format!("Input start failed: {}", e),
        })?;
        output_stream
            .play()
            .map_err(|e| AudioError::HardwareError {
                details: format!("Output start failed: {}", e),
            })?;

        self.input_stream = Some(input_stream);
        self.output_stream = Some(output_stream);

        tracing::info!(
            "[AudioEngine] Streams started at {} Hz nominal",
            self.sample_rate
        );
        Ok(())
    }

    /// Stop both streams. Dropping a cpal stream closes it.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stream) = self.input_stream.take() {
            drop(stream);
        }
        if let Some(stream) = self.output_stream.take() {
            drop(stream);
        }
        Ok(())
    }
}
