// Spectrum production - windowed FFT and the per-tick magnitude frame
//
// The FftProcessor turns one full sample window into a half-spectrum of
// magnitudes on an internal dB-like scale (not calibrated SPL). Each analysis
// tick replaces the previous SpectrumFrame wholesale, so downstream consumers
// never observe a mix of old and new bins.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use crate::error::AnalysisError;

/// One spectrum snapshot: `buffer_size / 2` magnitude bins in dB.
///
/// Bin `i` covers frequencies starting at `i * sample_rate / buffer_size` Hz.
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    bins: Vec<f32>,
    sample_rate: u32,
    buffer_size: usize,
}

impl SpectrumFrame {
    /// Wrap an externally computed magnitude spectrum.
    ///
    /// `bins.len()` must equal `buffer_size / 2`.
    pub fn new(bins: Vec<f32>, sample_rate: u32, buffer_size: usize) -> Self {
        debug_assert_eq!(bins.len(), buffer_size / 2);
        Self {
            bins,
            sample_rate,
            buffer_size,
        }
    }

    pub fn bins(&self) -> &[f32] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frequency of bin `index` via integer truncation.
    pub fn bin_hz(&self, index: usize) -> u32 {
        (index as u64 * self.sample_rate as u64 / self.buffer_size as u64) as u32
    }

    /// Bin index covering `hz`, clamped to the valid bin range.
    pub fn bin_of_hz(&self, hz: f32) -> usize {
        if hz <= 0.0 || self.bins.is_empty() {
            return 0;
        }
        let bin = (hz * self.buffer_size as f32 / self.sample_rate as f32) as usize;
        bin.min(self.bins.len() - 1)
    }
}

/// FFT processor computing magnitude-dB spectra from full sample windows.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    buffer_size: usize,
    /// Hann window, pre-computed to reduce spectral leakage
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl FftProcessor {
    /// Create a processor for windows of `buffer_size` samples.
    pub fn new(buffer_size: usize) -> Result<Self, AnalysisError> {
        if buffer_size == 0 || !buffer_size.is_power_of_two() {
            return Err(AnalysisError::InvalidConfiguration {
                reason: format!("FFT size must be a power of two (got {})", buffer_size),
            });
        }

        let window = (0..buffer_size)
            .map(|i| {
                0.5 * (1.0
                    - ((2.0 * std::f32::consts::PI * i as f32) / (buffer_size as f32 - 1.0)).cos())
            })
            .collect();

        let fft = FftPlanner::new().plan_fft_forward(buffer_size);

        Ok(Self {
            fft,
            buffer_size,
            window,
            scratch: vec![Complex::new(0.0, 0.0); buffer_size],
        })
    }

    /// Transform one full window into `buffer_size / 2` magnitude-dB bins.
    ///
    /// `audio.len()` must equal the configured window size.
    pub fn magnitude_db(&mut self, audio: &[f32]) -> Vec<f32> {
        debug_assert_eq!(audio.len(), self.buffer_size);

        for (slot, (sample, window_val)) in self
            .scratch
            .iter_mut()
            .zip(audio.iter().zip(self.window.iter()))
        {
            *slot = Complex::new(sample * window_val, 0.0);
        }

        self.fft.process(&mut self.scratch);

        // Raw transform magnitude in dB, deliberately uncalibrated: the
        // silence floor threshold is tuned against this internal scale, on
        // which a loud tone in an 8192 window reads around +60 dB.
        self.scratch[..self.buffer_size / 2]
            .iter()
            .map(|c| 20.0 * c.norm().max(1e-6).log10())
            .collect()
    }
}
