// Audio module - device I/O, sample accumulation, and probe tone synthesis

pub mod buffer_pool;
pub mod engine_cpal;
pub mod ring;
pub mod tone;

pub use buffer_pool::{AnalysisThreadChannels, AudioThreadChannels, BufferPool};
pub use engine_cpal::AudioEngine;
pub use ring::SampleBuffer;
pub use tone::{ProbeControl, ToneGenerator};
