// Sonascope - streaming spectral analysis and peak-tracking engine
// Circular-buffer-fed FFT pipeline with dual-peak tracking and ultrasonic
// Doppler gesture classification

pub mod analysis;
pub mod api;
pub mod audio;
pub mod config;
pub mod error;

pub use analysis::{AnalysisUpdate, Gesture, SpectrumFrame, SpectrumPipeline};
pub use api::Sonascope;
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, AudioError, ErrorCode};

use once_cell::sync::OnceCell;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the tracing subscriber once per process. Safe to call repeatedly;
/// later calls are no-ops, as is calling it when the host already installed
/// its own subscriber.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let _ = tracing_subscriber::fmt().with_target(false).try_init();
    });
}
