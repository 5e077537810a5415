//! Configuration management for the analysis pipeline
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling threshold tuning without recompilation. All constants here are
//! tunable defaults taken from field experimentation, not derived values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::AnalysisError;

/// Complete analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Sample window size in samples; must be a power of two
    pub buffer_size: usize,
    /// Analysis ticks per second
    pub tick_rate_hz: u32,
    pub peaks: PeakTrackingConfig,
    pub gesture: GestureConfig,
    pub audio: AudioConfig,
}

/// Dual-peak extraction and debouncing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakTrackingConfig {
    /// Half-width in bins of the exclusion zone around the primary peak
    pub exclusion_half_width: usize,
    /// Spectra whose global maximum sits below this magnitude report no signal
    pub silence_floor_db: f32,
    /// Dwell time before a primary peak value is published
    pub primary_dwell_ms: u64,
    /// Dwell time before a secondary peak value is published
    pub secondary_dwell_ms: u64,
}

impl Default for PeakTrackingConfig {
    fn default() -> Self {
        Self {
            exclusion_half_width: 6,
            // The FFT output is an internal dB-like scale, not calibrated SPL
            silence_floor_db: -0.5,
            primary_dwell_ms: 180,
            secondary_dwell_ms: 120,
        }
    }
}

/// Sideband gesture classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Gap between the probe frequency and the inner edge of each sideband
    pub band_offset_hz: f32,
    /// Width of each sideband window
    pub band_width_hz: f32,
    /// Tick-over-tick average rise required to classify motion
    pub delta_threshold_db: f32,
    /// Dwell time before a gesture is surfaced
    pub gesture_dwell_ms: u64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            band_offset_hz: 100.0,
            band_width_hz: 500.0,
            delta_threshold_db: 1.75,
            gesture_dwell_ms: 100,
        }
    }
}

/// Audio transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Number of pooled transfer buffers between audio and analysis threads
    pub buffer_pool_size: usize,
    /// Size of each transfer buffer in samples
    pub chunk_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            buffer_pool_size: 16,
            chunk_size: 4096,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 8192,
            tick_rate_hz: 20,
            peaks: PeakTrackingConfig::default(),
            gesture: GestureConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Validate the configuration.
    ///
    /// Called at pipeline construction; a configuration that passes here can
    /// never fail mid-stream.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.buffer_size == 0 || !self.buffer_size.is_power_of_two() {
            return Err(AnalysisError::InvalidConfiguration {
                reason: format!(
                    "buffer_size must be a power of two (got {})",
                    self.buffer_size
                ),
            });
        }
        if self.tick_rate_hz == 0 {
            return Err(AnalysisError::InvalidConfiguration {
                reason: "tick_rate_hz must be greater than 0".to_string(),
            });
        }
        if self.gesture.band_width_hz <= 0.0 {
            return Err(AnalysisError::InvalidConfiguration {
                reason: format!(
                    "gesture band_width_hz must be positive (got {})",
                    self.gesture.band_width_hz
                ),
            });
        }
        if self.audio.buffer_pool_size == 0 || self.audio.chunk_size == 0 {
            return Err(AnalysisError::InvalidConfiguration {
                reason: "audio buffer pool dimensions must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Load configuration from a JSON file, falling back to defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
