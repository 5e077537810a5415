// Analysis module - the streaming spectral analysis pipeline
//
// Orchestration: SampleBuffer -> FFT -> SpectrumFrame -> { PeakExtractor,
// GestureClassifier } -> StabilityDebouncers -> AnalysisUpdate.
//
// `SpectrumPipeline` is the freestanding, synchronous core: any host can
// drive ticks with whatever scheduling primitive it has, as long as one
// context pushes samples and one context ticks. `spawn_analysis_thread`
// provides the standard deployment: a dedicated thread draining the
// lock-free data queue and ticking at a fixed cadence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rtrb::PopError;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub mod debounce;
pub mod gesture;
pub mod peaks;
pub mod spectrum;

use crate::audio::buffer_pool::AnalysisThreadChannels;
use crate::audio::ring::SampleBuffer;
use crate::audio::tone::ProbeControl;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use debounce::StabilityDebouncer;
pub use gesture::Gesture;
use gesture::GestureClassifier;
pub use peaks::{PeakPair, PeakRecord};
use peaks::PeakExtractor;
pub use spectrum::{FftProcessor, SpectrumFrame};

/// One tick's debounced observable outputs.
///
/// These are the only values a host application should read; raw bin indices
/// and sideband averages are internal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisUpdate {
    /// Dominant frequency, post-debounce; `None` until a value has survived
    /// its dwell, or while the spectrum reads as silence
    pub primary_hz: Option<u32>,
    /// Second-dominant frequency, post-debounce
    pub secondary_hz: Option<u32>,
    /// Gesture classification, post-debounce
    pub gesture: Gesture,
    /// Milliseconds since the pipeline was created
    pub timestamp_ms: u64,
}

/// The complete analysis pipeline for one audio stream.
pub struct SpectrumPipeline {
    sample_rate: u32,
    buffer_size: usize,
    ring: SampleBuffer,
    fft: FftProcessor,
    extractor: PeakExtractor,
    primary_gate: StabilityDebouncer<Option<u32>>,
    secondary_gate: StabilityDebouncer<Option<u32>>,
    classifier: GestureClassifier,
    gesture_gate: StabilityDebouncer<Gesture>,
    /// Private copy-on-read snapshot; the transform never touches the ring
    scratch: Vec<f32>,
    frame: Option<SpectrumFrame>,
    created_at: Instant,
}

impl SpectrumPipeline {
    /// Build a pipeline from a validated configuration.
    ///
    /// # Errors
    /// `InvalidConfiguration` for a non-power-of-two buffer size, zero tick
    /// rate, or zero-width gesture window. Never fails after construction.
    pub fn new(config: &AnalyzerConfig, sample_rate: u32) -> Result<Self, AnalysisError> {
        config.validate()?;

        Ok(Self {
            sample_rate,
            buffer_size: config.buffer_size,
            ring: SampleBuffer::new(config.buffer_size)?,
            fft: FftProcessor::new(config.buffer_size)?,
            extractor: PeakExtractor::new(
                config.peaks.exclusion_half_width,
                config.peaks.silence_floor_db,
            ),
            primary_gate: StabilityDebouncer::new(Duration::from_millis(
                config.peaks.primary_dwell_ms,
            )),
            secondary_gate: StabilityDebouncer::new(Duration::from_millis(
                config.peaks.secondary_dwell_ms,
            )),
            classifier: GestureClassifier::new(&config.gesture, sample_rate, config.buffer_size),
            gesture_gate: StabilityDebouncer::new(Duration::from_millis(
                config.gesture.gesture_dwell_ms,
            )),
            scratch: vec![0.0; config.buffer_size],
            frame: None,
            created_at: Instant::now(),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Producer side: append newly captured samples.
    pub fn push_samples(&mut self, samples: &[f32]) {
        self.ring.write(samples);
    }

    /// Whether enough samples have accumulated for the first tick.
    pub fn is_primed(&self) -> bool {
        self.ring.is_filled()
    }

    /// Redefine the probe frequency and restart the gesture baseline.
    pub fn set_probe(&mut self, probe_hz: f32) {
        self.classifier.set_probe(probe_hz);
        self.gesture_gate.reset();
    }

    /// Run one analysis tick at time `now`.
    ///
    /// Pulls exactly one window from the sample buffer, transforms it, and
    /// feeds the identical frame to both consumers. If the producer has
    /// stalled the tick reuses stale samples; the only error is
    /// `InsufficientData` before the buffer has filled once, which the
    /// caller should treat as "retry next tick".
    pub fn tick(&mut self, now: Instant) -> Result<AnalysisUpdate, AnalysisError> {
        self.ring.read_latest_into(&mut self.scratch)?;
        let bins = self.fft.magnitude_db(&self.scratch);
        let frame = SpectrumFrame::new(bins, self.sample_rate, self.buffer_size);
        let update = self.process_frame(frame, now);
        Ok(update)
    }

    /// Analyze one already-computed spectrum frame.
    ///
    /// This is the transform seam: offline hosts (and tests) can feed frames
    /// produced elsewhere. The frame replaces the previous one wholesale and
    /// both consumers observe the same instance within the tick.
    pub fn process_frame(&mut self, frame: SpectrumFrame, now: Instant) -> AnalysisUpdate {
        let peak_pair = self.extractor.extract_top_two(&frame);
        let primary_hz = self
            .primary_gate
            .observe(peak_pair.primary.map(|p| p.frequency_hz), now)
            .flatten();
        let secondary_hz = self
            .secondary_gate
            .observe(peak_pair.secondary.map(|p| p.frequency_hz), now)
            .flatten();

        let raw_gesture = self.classifier.classify(&frame);
        let gesture = self
            .gesture_gate
            .observe(raw_gesture, now)
            .unwrap_or(Gesture::None);

        self.frame = Some(frame);

        AnalysisUpdate {
            primary_hz,
            secondary_hz,
            gesture,
            timestamp_ms: now.saturating_duration_since(self.created_at).as_millis() as u64,
        }
    }

    /// The spectrum computed by the most recent tick, if any.
    pub fn latest_frame(&self) -> Option<&SpectrumFrame> {
        self.frame.as_ref()
    }
}

/// Spawn the analysis thread.
///
/// The thread drains the SPSC data queue into the pipeline's sample buffer
/// and runs ticks at `tick_period`, publishing every update to the broadcast
/// channel and the shared snapshot. Probe retunes arrive through the shared
/// [`ProbeControl`]; the shutdown flag is checked between ticks only, so a
/// tick always runs to completion.
#[allow(clippy::too_many_arguments)]
pub fn spawn_analysis_thread(
    mut channels: AnalysisThreadChannels,
    mut pipeline: SpectrumPipeline,
    probe: Arc<ProbeControl>,
    tick_period: Duration,
    update_tx: broadcast::Sender<AnalysisUpdate>,
    snapshot: Arc<RwLock<AnalysisUpdate>>,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        tracing::info!(
            "[AnalysisThread] Starting analysis loop, tick period {:?}",
            tick_period
        );

        let mut next_tick = Instant::now() + tick_period;
        let mut last_probe_hz = 0.0f32;

        loop {
            if shutdown.load(Ordering::SeqCst) {
                tracing::info!("[AnalysisThread] Shutdown flag set, exiting");
                break;
            }

            // Drain captured audio into the ring, recycling buffers
            loop {
                match channels.data_consumer.pop() {
                    Ok(buffer) => {
                        pipeline.push_samples(&buffer);
                        if channels.pool_producer.push(buffer).is_err() {
                            tracing::warn!("[AnalysisThread] Pool queue full, dropping buffer");
                        }
                    }
                    Err(PopError::Empty) => break,
                }
            }

            let now = Instant::now();
            if now < next_tick {
                thread::sleep(Duration::from_millis(1).min(next_tick - now));
                continue;
            }
            next_tick += tick_period;
            if next_tick < now {
                // Fell behind (e.g. suspended host): resynchronize rather
                // than firing a burst of catch-up ticks
                next_tick = now + tick_period;
            }

            let probe_hz = probe.frequency_hz();
            if probe_hz != last_probe_hz {
                if probe_hz > 0.0 {
                    tracing::info!("[AnalysisThread] Probe retuned to {} Hz", probe_hz);
                    pipeline.set_probe(probe_hz);
                }
                last_probe_hz = probe_hz;
            }

            match pipeline.tick(now) {
                Ok(update) => {
                    if let Ok(mut latest) = snapshot.write() {
                        *latest = update.clone();
                    }
                    let _ = update_tx.send(update);
                }
                Err(AnalysisError::InsufficientData {
                    required,
                    available,
                }) => {
                    // Expected at startup until the buffer fills once
                    tracing::debug!(
                        "[AnalysisThread] Buffer priming: {}/{} samples",
                        available,
                        required
                    );
                }
                Err(err) => {
                    tracing::warn!("[AnalysisThread] Tick failed: {}", err);
                }
            }
        }
    })
}
