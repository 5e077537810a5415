// Error types for the sonascope analysis engine
//
// This module defines custom error types for audio and analysis operations,
// providing structured error handling with numeric codes suitable for host
// application integration.

use log::error;
use std::fmt;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling at the
/// host boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Log an audio error with structured context
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=AudioEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover audio engine operations including stream management
/// and hardware access.
///
/// Error code range: 1001-1004
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Audio engine is already running
    AlreadyRunning,

    /// Audio engine is not running
    NotRunning,

    /// Hardware error occurred
    HardwareError { details: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::AlreadyRunning => 1001,
            AudioError::NotRunning => 1002,
            AudioError::HardwareError { .. } => 1003,
            AudioError::StreamOpenFailed { .. } => 1004,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::AlreadyRunning => {
                "Audio engine already running. Call stop() first.".to_string()
            }
            AudioError::NotRunning => "Audio engine not running. Call start() first.".to_string(),
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

/// Convert from std::io::Error to AudioError
impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}

/// Analysis-related errors
///
/// These errors cover the spectral analysis pipeline. `InsufficientData` is
/// recoverable: the caller should retry on the next tick. `InvalidConfiguration`
/// is only ever raised at construction time, never mid-stream.
///
/// Error code range: 2001-2002
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Sample buffer has not yet accumulated enough data
    InsufficientData { required: usize, available: usize },

    /// Configuration rejected at construction time
    InvalidConfiguration { reason: String },
}

impl ErrorCode for AnalysisError {
    fn code(&self) -> i32 {
        match self {
            AnalysisError::InsufficientData { .. } => 2001,
            AnalysisError::InvalidConfiguration { .. } => 2002,
        }
    }

    fn message(&self) -> String {
        match self {
            AnalysisError::InsufficientData {
                required,
                available,
            } => {
                format!(
                    "Sample buffer not yet filled: need {}, have {}",
                    required, available
                )
            }
            AnalysisError::InvalidConfiguration { reason } => {
                format!("Invalid configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnalysisError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AnalysisError {}
