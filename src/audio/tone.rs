//! Probe tone synthesis - phase-accumulator sine generation
//!
//! The gesture detector emits a near-ultrasonic probe tone from the output
//! path and watches for Doppler sidebands around it on the input path. This
//! module provides the tone generator driven inside the output callback plus
//! the atomic control cell shared between the host, the output callback, and
//! the analysis thread.
//!
//! Real-time safety: `next_sample` performs only arithmetic and atomic loads,
//! no allocation or locking.

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Amplitude of the synthesized probe tone
const TONE_AMPLITUDE: f32 = 0.9;

/// Frequency added to the probe during the chirp slot of pulsed mode
const PULSE_CHIRP_HZ: f32 = 1000.0;

/// Pulse scheduler rate: the slot counter advances five times per second
const PULSE_SLOTS_PER_SEC: u32 = 5;

/// Number of slots in one pulse cycle (slot 0 = tone, 1 = chirp, 2..=5 = silence)
const PULSE_CYCLE_SLOTS: u32 = 6;

/// Shared control cell for the probe tone.
///
/// Frequency is stored as f32 bits in an AtomicU32 so the audio callback can
/// retune without locking. A frequency of 0.0 means "never set": the gesture
/// classifier stays silent and the output path emits nothing.
pub struct ProbeControl {
    frequency_bits: AtomicU32,
    enabled: AtomicBool,
    pulsing: AtomicBool,
}

impl ProbeControl {
    pub fn new() -> Self {
        Self {
            frequency_bits: AtomicU32::new(0.0f32.to_bits()),
            enabled: AtomicBool::new(false),
            pulsing: AtomicBool::new(false),
        }
    }

    /// Retune the probe. Safe to call from any thread while audio is running.
    pub fn set_frequency_hz(&self, hz: f32) {
        self.frequency_bits.store(hz.to_bits(), Ordering::Relaxed);
    }

    pub fn frequency_hz(&self) -> f32 {
        f32::from_bits(self.frequency_bits.load(Ordering::Relaxed))
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_pulsing(&self, pulsing: bool) {
        self.pulsing.store(pulsing, Ordering::Relaxed);
    }

    pub fn pulsing(&self) -> bool {
        self.pulsing.load(Ordering::Relaxed)
    }
}

impl Default for ProbeControl {
    fn default() -> Self {
        Self::new()
    }
}

/// Sine generator owned by the output callback.
///
/// Phase accumulates per sample and wraps at 2π, so retuning mid-stream never
/// produces a discontinuity. In pulsed mode a slot counter advancing at 5 Hz
/// selects between the base tone, a +1 kHz chirp burst, and silence.
pub struct ToneGenerator {
    sample_rate: u32,
    phase: f32,
    pulse_slot: u32,
    samples_into_slot: u32,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            phase: 0.0,
            pulse_slot: 0,
            samples_into_slot: 0,
        }
    }

    /// Produce the next output sample for the given probe state.
    pub fn next_sample(&mut self, probe: &ProbeControl) -> f32 {
        let frequency = probe.frequency_hz();
        if !probe.enabled() || frequency <= 0.0 {
            return 0.0;
        }

        let mut add_freq = 0.0;
        let mut mult = 1.0;
        if probe.pulsing() {
            self.advance_pulse_slot();
            if self.pulse_slot == 1 {
                add_freq = PULSE_CHIRP_HZ;
            } else if self.pulse_slot > 1 {
                mult = 0.0;
            }
        }

        let phase_increment = 2.0 * PI * (frequency + add_freq) / self.sample_rate as f32;
        let sample = TONE_AMPLITUDE * self.phase.sin() * mult;
        self.phase += phase_increment;
        if self.phase >= 2.0 * PI {
            self.phase -= 2.0 * PI;
        }
        sample
    }

    fn advance_pulse_slot(&mut self) {
        self.samples_into_slot += 1;
        let samples_per_slot = (self.sample_rate / PULSE_SLOTS_PER_SEC).max(1);
        if self.samples_into_slot >= samples_per_slot {
            self.samples_into_slot = 0;
            self.pulse_slot += 1;
            if self.pulse_slot >= PULSE_CYCLE_SLOTS {
                self.pulse_slot = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_until_enabled() {
        let probe = ProbeControl::new();
        probe.set_frequency_hz(18_000.0);
        let mut gen = ToneGenerator::new(48_000);

        for _ in 0..128 {
            assert_eq!(gen.next_sample(&probe), 0.0);
        }

        probe.set_enabled(true);
        let energy: f32 = (0..128).map(|_| gen.next_sample(&probe).abs()).sum();
        assert!(energy > 0.0, "Enabled tone should produce output");
    }

    #[test]
    fn test_silent_when_frequency_unset() {
        let probe = ProbeControl::new();
        probe.set_enabled(true);
        let mut gen = ToneGenerator::new(48_000);

        for _ in 0..128 {
            assert_eq!(gen.next_sample(&probe), 0.0);
        }
    }

    #[test]
    fn test_amplitude_bounds() {
        let probe = ProbeControl::new();
        probe.set_frequency_hz(440.0);
        probe.set_enabled(true);
        let mut gen = ToneGenerator::new(48_000);

        for _ in 0..48_000 {
            let sample = gen.next_sample(&probe);
            assert!(
                sample.abs() <= TONE_AMPLITUDE + 1e-6,
                "Sample {} exceeds amplitude bound",
                sample
            );
        }
    }

    #[test]
    fn test_tone_frequency_via_zero_crossings() {
        let probe = ProbeControl::new();
        probe.set_frequency_hz(1000.0);
        probe.set_enabled(true);
        let sample_rate = 48_000;
        let mut gen = ToneGenerator::new(sample_rate);

        let samples: Vec<f32> = (0..sample_rate).map(|_| gen.next_sample(&probe)).collect();
        let crossings = samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count();

        // One upward zero crossing per cycle, 1000 cycles in one second
        assert!(
            (999..=1001).contains(&crossings),
            "Expected ~1000 crossings, got {}",
            crossings
        );
    }

    #[test]
    fn test_pulsed_mode_has_silent_slots() {
        let probe = ProbeControl::new();
        probe.set_frequency_hz(18_000.0);
        probe.set_enabled(true);
        probe.set_pulsing(true);
        let sample_rate = 48_000;
        let mut gen = ToneGenerator::new(sample_rate);

        // Render 1.2s (one full pulse cycle) and count silent samples
        let total = (sample_rate as f32 * 1.2) as usize;
        let silent = (0..total)
            .filter(|_| gen.next_sample(&probe) == 0.0)
            .count();

        // Slots 2..=5 of 6 are silent: roughly two thirds of the cycle
        let fraction = silent as f32 / total as f32;
        assert!(
            fraction > 0.5,
            "Expected mostly-silent pulse cycle, got {:.2} silent fraction",
            fraction
        );
        assert!(
            fraction < 0.8,
            "Pulse cycle should still contain tone bursts, got {:.2} silent fraction",
            fraction
        );
    }
}
