// StabilityDebouncer - commit-on-stability gating of noisy detections
//
// FFT bin quantization plus measurement noise makes a raw peak index jitter
// by a bin from tick to tick even for a stationary tone. This gate keeps a
// candidate value pending until it has survived a dwell period unchanged,
// and only then publishes it. A change of detected value restarts the dwell
// but leaves the previously published value visible, so the surfaced output
// never flickers to empty during a transition.

use std::time::{Duration, Instant};

pub struct StabilityDebouncer<T> {
    dwell: Duration,
    candidate: Option<(T, Instant)>,
    published: Option<T>,
}

impl<T: Copy + PartialEq> StabilityDebouncer<T> {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            candidate: None,
            published: None,
        }
    }

    /// Feed this tick's detected value; returns the currently published value.
    ///
    /// Publishes `value` once it has been observed unchanged for at least the
    /// dwell duration. A differing value restarts the dwell from `now`.
    pub fn observe(&mut self, value: T, now: Instant) -> Option<T> {
        match self.candidate {
            Some((candidate, since)) if candidate == value => {
                if now.saturating_duration_since(since) >= self.dwell {
                    self.published = Some(value);
                }
            }
            _ => {
                self.candidate = Some((value, now));
                if self.dwell.is_zero() {
                    self.published = Some(value);
                }
            }
        }
        self.published
    }

    /// Last published value, if any value has ever survived a dwell.
    pub fn published(&self) -> Option<T> {
        self.published
    }

    /// Drop all tracking state, returning to the unset state.
    pub fn reset(&mut self) {
        self.candidate = None;
        self.published = None;
    }
}
