//! Sonascope - the public facade over the audio engine and analysis pipeline
//!
//! Owns the shared channels and lifecycle: `start` wires the cpal engine to a
//! fresh analysis thread, `stop` tears both down. Starting and stopping are
//! all-or-nothing transitions applied between ticks; a tick in flight always
//! runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::analysis::{spawn_analysis_thread, AnalysisUpdate, Gesture, SpectrumPipeline};
use crate::audio::{AudioEngine, BufferPool, ProbeControl};
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, AudioError};

/// Capacity of the update broadcast channel; slow subscribers lag rather
/// than block the analysis thread.
const UPDATE_CHANNEL_CAPACITY: usize = 128;

pub struct Sonascope {
    config: AnalyzerConfig,
    sample_rate: u32,
    probe: Arc<ProbeControl>,
    update_tx: broadcast::Sender<AnalysisUpdate>,
    snapshot: Arc<RwLock<AnalysisUpdate>>,
    shutdown: Arc<AtomicBool>,
    engine: Option<AudioEngine>,
    analysis_thread: Option<JoinHandle<()>>,
}

impl Sonascope {
    /// Create a handle with a validated configuration.
    ///
    /// # Errors
    /// `InvalidConfiguration` for a bad configuration; nothing is opened or
    /// spawned until [`start`](Self::start).
    pub fn new(config: AnalyzerConfig, sample_rate: u32) -> Result<Self, AnalysisError> {
        config.validate()?;
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            sample_rate,
            probe: Arc::new(ProbeControl::new()),
            update_tx,
            snapshot: Arc::new(RwLock::new(AnalysisUpdate::default())),
            shutdown: Arc::new(AtomicBool::new(false)),
            engine: None,
            analysis_thread: None,
        })
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_some()
    }

    /// Subscribe to audio and begin ticking.
    pub fn start(&mut self) -> Result<(), AudioError> {
        if self.is_running() {
            return Err(AudioError::AlreadyRunning);
        }

        let pipeline = SpectrumPipeline::new(&self.config, self.sample_rate).map_err(|err| {
            // Config was validated in new(); reaching this means the device
            // geometry disagrees with it
            AudioError::StreamOpenFailed {
                reason: format!("analysis pipeline rejected configuration: {}", err),
            }
        })?;

        let (audio_channels, analysis_channels) = BufferPool::new(
            self.config.audio.buffer_pool_size,
            self.config.audio.chunk_size,
        );

        let mut engine =
            AudioEngine::new(self.sample_rate, Arc::clone(&self.probe), audio_channels);
        if let Err(err) = engine.start() {
            crate::error::log_audio_error(&err, "Sonascope::start");
            return Err(err);
        }

        self.shutdown.store(false, Ordering::SeqCst);
        let tick_period = Duration::from_secs_f64(1.0 / self.config.tick_rate_hz as f64);
        let handle = spawn_analysis_thread(
            analysis_channels,
            pipeline,
            Arc::clone(&self.probe),
            tick_period,
            self.update_tx.clone(),
            Arc::clone(&self.snapshot),
            Arc::clone(&self.shutdown),
        );

        self.engine = Some(engine);
        self.analysis_thread = Some(handle);
        Ok(())
    }

    /// Unsubscribe from audio and stop ticking.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        let Some(mut engine) = self.engine.take() else {
            return Err(AudioError::NotRunning);
        };

        engine.stop()?;
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.analysis_thread.take() {
            if handle.join().is_err() {
                tracing::warn!("[Sonascope] Analysis thread panicked during shutdown");
            }
        }
        Ok(())
    }

    /// Retune the probe tone; takes effect on the next tick and resets the
    /// gesture baseline.
    pub fn set_probe_hz(&self, hz: f32) {
        self.probe.set_frequency_hz(hz);
    }

    pub fn probe_hz(&self) -> f32 {
        self.probe.frequency_hz()
    }

    /// Enable or disable the probe tone on the output path.
    pub fn set_tone_enabled(&self, enabled: bool) {
        self.probe.set_enabled(enabled);
    }

    /// Enable or disable pulsed probe mode.
    pub fn set_pulsing(&self, pulsing: bool) {
        self.probe.set_pulsing(pulsing);
    }

    /// Dominant frequency, post-debounce.
    pub fn primary_frequency_hz(&self) -> Option<u32> {
        self.snapshot.read().ok().and_then(|s| s.primary_hz)
    }

    /// Second-dominant frequency, post-debounce.
    pub fn secondary_frequency_hz(&self) -> Option<u32> {
        self.snapshot.read().ok().and_then(|s| s.secondary_hz)
    }

    /// Current gesture classification, post-debounce.
    pub fn gesture(&self) -> Gesture {
        self.snapshot
            .read()
            .map(|s| s.gesture)
            .unwrap_or(Gesture::None)
    }

    /// Subscribe to per-tick updates.
    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisUpdate> {
        self.update_tx.subscribe()
    }

    /// Per-tick updates as an async stream; lagged items are skipped.
    pub fn updates_stream(&self) -> impl Stream<Item = AnalysisUpdate> {
        BroadcastStream::new(self.update_tx.subscribe()).filter_map(|item| async { item.ok() })
    }
}

impl Drop for Sonascope {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}
