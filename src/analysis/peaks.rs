// PeakExtractor - dual-peak extraction with an exclusion zone
//
// Finds the dominant bin, masks out a neighborhood around it, and finds the
// next-highest bin outside that neighborhood. Ties break toward the first
// index in scan order (the lowest frequency), which keeps the output
// deterministic for property testing. The scan skips excluded indices
// directly, so there is no filter-then-remap step and no boundary ambiguity.

use super::spectrum::SpectrumFrame;

/// One extracted spectral peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRecord {
    pub frequency_hz: u32,
    pub bin: usize,
    pub magnitude_db: f32,
}

/// Primary and secondary peaks of one frame. `None` means no signal: the
/// spectrum's global maximum sat below the silence floor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakPair {
    pub primary: Option<PeakRecord>,
    pub secondary: Option<PeakRecord>,
}

pub struct PeakExtractor {
    exclusion_half_width: usize,
    silence_floor_db: f32,
}

impl PeakExtractor {
    pub fn new(exclusion_half_width: usize, silence_floor_db: f32) -> Self {
        Self {
            exclusion_half_width,
            silence_floor_db,
        }
    }

    /// Extract the two dominant peaks of `frame`.
    ///
    /// Returns an empty pair when the frame is empty or its maximum is below
    /// the silence floor; this is an expected runtime state, not an error.
    pub fn extract_top_two(&self, frame: &SpectrumFrame) -> PeakPair {
        let bins = frame.bins();
        let Some(primary_bin) = argmax(bins.iter().enumerate()) else {
            return PeakPair::default();
        };

        if bins[primary_bin] < self.silence_floor_db {
            return PeakPair::default();
        }

        let exclude_start = primary_bin.saturating_sub(self.exclusion_half_width);
        let exclude_end = (primary_bin + self.exclusion_half_width).min(bins.len() - 1);

        let secondary_bin = argmax(
            bins.iter()
                .enumerate()
                .filter(|(i, _)| *i < exclude_start || *i > exclude_end),
        );

        PeakPair {
            primary: Some(self.record(frame, primary_bin)),
            secondary: secondary_bin.map(|bin| self.record(frame, bin)),
        }
    }

    fn record(&self, frame: &SpectrumFrame, bin: usize) -> PeakRecord {
        PeakRecord {
            frequency_hz: frame.bin_hz(bin),
            bin,
            magnitude_db: frame.bins()[bin],
        }
    }
}

/// Index of the strictly greatest value; the first occurrence wins on ties.
fn argmax<'a, I>(values: I) -> Option<usize>
where
    I: Iterator<Item = (usize, &'a f32)>,
{
    let mut best: Option<(usize, f32)> = None;
    for (i, &value) in values {
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}
