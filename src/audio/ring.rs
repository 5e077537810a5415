// SampleBuffer - fixed-capacity circular accumulator of audio samples
//
// The hardware callback delivers samples in driver-defined frame counts that
// are never aligned to the analysis window, so the buffer accepts arbitrary
// chunk sizes and overwrites the oldest data once capacity is exceeded.
// Readers always get the most recent `n` samples in chronological order.
//
// The buffer is owned exclusively by the analysis thread; the audio callback
// hands frames over through the lock-free buffer pool, so a reader can never
// observe a write in progress.

use crate::error::AnalysisError;

/// Circular accumulator holding the most recent `capacity` samples.
pub struct SampleBuffer {
    samples: Vec<f32>,
    write_pos: usize,
    total_written: u64,
}

impl SampleBuffer {
    /// Create a buffer with the given capacity.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if `capacity` is zero or not a power
    /// of two.
    pub fn new(capacity: usize) -> Result<Self, AnalysisError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(AnalysisError::InvalidConfiguration {
                reason: format!("sample buffer capacity must be a power of two (got {})", capacity),
            });
        }
        Ok(Self {
            samples: vec![0.0; capacity],
            write_pos: 0,
            total_written: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Total samples ever written, including overwritten ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Whether a full window of `capacity` samples has been accumulated.
    pub fn is_filled(&self) -> bool {
        self.total_written >= self.samples.len() as u64
    }

    /// Append newly arrived samples, overwriting the oldest data once
    /// capacity is exceeded. Chunks larger than the capacity are legal; only
    /// the newest `capacity` samples of such a chunk survive.
    pub fn write(&mut self, samples: &[f32]) {
        let cap = self.samples.len();
        self.total_written = self.total_written.saturating_add(samples.len() as u64);

        let mut incoming = samples;
        if incoming.len() > cap {
            incoming = &incoming[incoming.len() - cap..];
        }

        let first = (cap - self.write_pos).min(incoming.len());
        self.samples[self.write_pos..self.write_pos + first].copy_from_slice(&incoming[..first]);
        let rest = incoming.len() - first;
        if rest > 0 {
            self.samples[..rest].copy_from_slice(&incoming[first..]);
        }
        self.write_pos = (self.write_pos + incoming.len()) & (cap - 1);
    }

    /// Copy the `out.len()` most recent samples into `out`, oldest first,
    /// ending at the most recent write.
    ///
    /// # Errors
    /// Returns `InsufficientData` until at least `out.len()` samples have
    /// been written, or if more than `capacity` samples are requested.
    pub fn read_latest_into(&self, out: &mut [f32]) -> Result<(), AnalysisError> {
        let cap = self.samples.len();
        let n = out.len();
        let available = self.total_written.min(cap as u64) as usize;
        if n > available {
            return Err(AnalysisError::InsufficientData {
                required: n,
                available,
            });
        }

        let start = (self.write_pos + cap - n) & (cap - 1);
        let first = (cap - start).min(n);
        out[..first].copy_from_slice(&self.samples[start..start + first]);
        if n > first {
            out[first..].copy_from_slice(&self.samples[..n - first]);
        }
        Ok(())
    }

    /// Convenience wrapper returning a freshly allocated copy.
    pub fn read_latest(&self, n: usize) -> Result<Vec<f32>, AnalysisError> {
        let mut out = vec![0.0; n];
        self.read_latest_into(&mut out)?;
        Ok(out)
    }
}
