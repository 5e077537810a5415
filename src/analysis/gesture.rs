// GestureClassifier - toward/away motion from probe-tone sideband energy
//
// A moving reflector Doppler-shifts the probe tone's echo, pushing energy
// into the sideband above the probe (motion toward the microphone) or below
// it (motion away). The classifier averages the magnitude in two flanking
// windows and compares each average against its own previous-tick value, so
// it tracks the rate of change of sideband energy rather than absolute
// level. Steady ambient noise therefore never fires it; only abrupt
// asymmetric energy shifts do.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::spectrum::SpectrumFrame;
use crate::config::GestureConfig;

/// Coarse motion classification relative to the microphone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    Toward,
    Away,
    #[default]
    None,
}

/// Sideband geometry and running averages for the current probe frequency.
///
/// Reset wholesale on every retune so a comparison never spans two probe
/// frequencies.
struct GestureBaseline {
    left: Range<usize>,
    right: Range<usize>,
    previous_left_avg: Option<f32>,
    previous_right_avg: Option<f32>,
}

pub struct GestureClassifier {
    sample_rate: u32,
    buffer_size: usize,
    band_offset_hz: f32,
    band_width_hz: f32,
    delta_threshold_db: f32,
    baseline: Option<GestureBaseline>,
}

impl GestureClassifier {
    pub fn new(config: &GestureConfig, sample_rate: u32, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            buffer_size,
            band_offset_hz: config.band_offset_hz,
            band_width_hz: config.band_width_hz,
            delta_threshold_db: config.delta_threshold_db,
            baseline: None,
        }
    }

    /// Redefine the probe frequency.
    ///
    /// Recomputes both sideband windows and clears the previous averages so
    /// stale comparisons from the prior probe never leak into the new
    /// baseline.
    pub fn set_probe(&mut self, probe_hz: f32) {
        let left_lo = probe_hz - self.band_offset_hz - self.band_width_hz;
        let left_hi = probe_hz - self.band_offset_hz;
        let right_lo = probe_hz + self.band_offset_hz;
        let right_hi = probe_hz + self.band_offset_hz + self.band_width_hz;

        self.baseline = Some(GestureBaseline {
            left: self.bin_range(left_lo, left_hi),
            right: self.bin_range(right_lo, right_hi),
            previous_left_avg: None,
            previous_right_avg: None,
        });
    }

    pub fn probe_set(&self) -> bool {
        self.baseline.is_some()
    }

    /// Classify this tick's frame. Returns `Gesture::None` until a probe has
    /// been set and a previous-tick baseline exists.
    pub fn classify(&mut self, frame: &SpectrumFrame) -> Gesture {
        let Some(baseline) = self.baseline.as_mut() else {
            return Gesture::None;
        };

        let left_avg = window_average(frame.bins(), &baseline.left);
        let right_avg = window_average(frame.bins(), &baseline.right);

        let gesture = match (baseline.previous_left_avg, baseline.previous_right_avg) {
            (Some(previous_left), Some(previous_right)) => {
                // Left window wins when both fire in the same tick
                if left_avg > previous_left + self.delta_threshold_db {
                    Gesture::Away
                } else if right_avg > previous_right + self.delta_threshold_db {
                    Gesture::Toward
                } else {
                    Gesture::None
                }
            }
            _ => Gesture::None,
        };

        baseline.previous_left_avg = Some(left_avg);
        baseline.previous_right_avg = Some(right_avg);
        gesture
    }

    /// Convert a frequency span to a clamped half-open bin range.
    fn bin_range(&self, lo_hz: f32, hi_hz: f32) -> Range<usize> {
        let spectrum_len = self.buffer_size / 2;
        let to_bin = |hz: f32| -> usize {
            if hz <= 0.0 {
                return 0;
            }
            ((hz * self.buffer_size as f32 / self.sample_rate as f32) as usize).min(spectrum_len)
        };
        let lo = to_bin(lo_hz);
        let hi = to_bin(hi_hz).max(lo);
        lo..hi
    }
}

/// Arithmetic mean magnitude over a window; an empty window averages to 0.0
/// as a defined fallback, never an error.
fn window_average(bins: &[f32], range: &Range<usize>) -> f32 {
    let end = range.end.min(bins.len());
    let start = range.start.min(end);
    if start == end {
        return 0.0;
    }
    let window = &bins[start..end];
    window.iter().sum::<f32>() / window.len() as f32
}
