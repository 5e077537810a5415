use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use sonascope::analysis::SpectrumPipeline;
use sonascope::{AnalyzerConfig, Sonascope};

#[derive(Parser, Debug)]
#[command(
    name = "sonascope_cli",
    about = "Dominant-frequency tracking and Doppler gesture sensing"
)]
struct Cli {
    /// Path to a JSON configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run live against the default audio devices, printing updates
    Live {
        /// Probe tone frequency in Hz (0 disables the gesture detector)
        #[arg(long, default_value_t = 18_000.0)]
        probe: f32,
        /// Emit the probe tone on the output device
        #[arg(long)]
        tone: bool,
        /// Pulse the probe tone instead of emitting it continuously
        #[arg(long)]
        pulse: bool,
        /// Nominal device sample rate in Hz
        #[arg(long, default_value_t = 48_000)]
        sample_rate: u32,
        /// How long to run before exiting
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
    /// Analyze a WAV file offline, ticking at the configured cadence
    Wav {
        path: PathBuf,
        /// Probe tone frequency in Hz for sideband analysis
        #[arg(long)]
        probe: Option<f32>,
    },
}

fn main() -> ExitCode {
    sonascope::init_logging();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AnalyzerConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Live {
            probe,
            tone,
            pulse,
            sample_rate,
            seconds,
        } => run_live(config, probe, tone, pulse, sample_rate, seconds),
        Commands::Wav { path, probe } => run_wav(config, &path, probe),
    }
}

fn run_live(
    config: AnalyzerConfig,
    probe: f32,
    tone: bool,
    pulse: bool,
    sample_rate: u32,
    seconds: u64,
) -> Result<ExitCode> {
    let mut scope =
        Sonascope::new(config, sample_rate).context("building analyzer from configuration")?;
    if probe > 0.0 {
        scope.set_probe_hz(probe);
        scope.set_tone_enabled(tone);
        scope.set_pulsing(pulse);
    }

    scope.start().context("starting audio engine")?;
    println!("Listening for {} seconds (probe {} Hz)...", seconds, probe);

    let mut rx = scope.subscribe();
    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last_line = String::new();
    while Instant::now() < deadline {
        match rx.try_recv() {
            Ok(update) => {
                let line = format!(
                    "primary {:>6} Hz | secondary {:>6} Hz | gesture {:?}",
                    update
                        .primary_hz
                        .map(|hz| hz.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    update
                        .secondary_hz
                        .map(|hz| hz.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    update.gesture,
                );
                if line != last_line {
                    println!("[{:>7} ms] {}", update.timestamp_ms, line);
                    last_line = line;
                }
            }
            Err(_) => std::thread::sleep(Duration::from_millis(5)),
        }
    }

    scope.stop().context("stopping audio engine")?;
    Ok(ExitCode::from(0))
}

fn run_wav(config: AnalyzerConfig, path: &PathBuf, probe: Option<f32>) -> Result<ExitCode> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    let samples = read_mono_samples(&mut reader, &spec)
        .with_context(|| format!("decoding {}", path.display()))?;

    if samples.len() < config.buffer_size {
        bail!(
            "{} holds {} samples but one analysis window needs {}",
            path.display(),
            samples.len(),
            config.buffer_size
        );
    }

    let tick_rate = config.tick_rate_hz;
    let chunk = (spec.sample_rate / tick_rate).max(1) as usize;
    let tick_period = Duration::from_secs_f64(1.0 / tick_rate as f64);

    let mut pipeline = SpectrumPipeline::new(&config, spec.sample_rate)
        .context("building analysis pipeline from configuration")?;
    if let Some(probe_hz) = probe {
        pipeline.set_probe(probe_hz);
    }

    println!(
        "Analyzing {} ({} Hz, {} samples, {} ticks/sec)",
        path.display(),
        spec.sample_rate,
        samples.len(),
        tick_rate
    );

    // Offline drive: one tick per chunk with synthetic timestamps, so the
    // debounce dwell behaves exactly as it would in real time
    let start = Instant::now();
    let mut last_line = String::new();
    for (i, window) in samples.chunks(chunk).enumerate() {
        pipeline.push_samples(window);
        let now = start + tick_period * i as u32;
        let Ok(update) = pipeline.tick(now) else {
            continue; // buffer still priming
        };

        let line = format!(
            "primary {:?} | secondary {:?} | gesture {:?}",
            update.primary_hz, update.secondary_hz, update.gesture
        );
        if line != last_line {
            println!("[tick {:>5}] {}", i, line);
            last_line = line;
        }
    }

    Ok(ExitCode::from(0))
}

fn read_mono_samples(
    reader: &mut hound::WavReader<std::io::BufReader<std::fs::File>>,
    spec: &hound::WavSpec,
) -> Result<Vec<f32>> {
    let channels = spec.channels.max(1) as usize;
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    Ok(samples)
}
