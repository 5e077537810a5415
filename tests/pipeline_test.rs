// End-to-end pipeline tests: synthetic spectra and time-domain signals
// driven through the full analysis path with simulated tick timing.

use std::time::{Duration, Instant};

use sonascope::analysis::{Gesture, SpectrumFrame, SpectrumPipeline};
use sonascope::AnalyzerConfig;

const SAMPLE_RATE: u32 = 48_000;
const BUFFER_SIZE: usize = 8192;
const TICK: Duration = Duration::from_millis(50);

fn pipeline() -> SpectrumPipeline {
    SpectrumPipeline::new(&AnalyzerConfig::default(), SAMPLE_RATE).unwrap()
}

/// Synthetic half-spectrum with chosen bins raised above a uniform floor.
fn frame_with_peaks(peaks: &[(usize, f32)], floor: f32) -> SpectrumFrame {
    let mut bins = vec![floor; BUFFER_SIZE / 2];
    for &(bin, magnitude) in peaks {
        bins[bin] = magnitude;
    }
    SpectrumFrame::new(bins, SAMPLE_RATE, BUFFER_SIZE)
}

fn sine(freq: f32, amplitude: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin()
        })
        .collect()
}

fn mix(parts: &[Vec<f32>]) -> Vec<f32> {
    let len = parts.iter().map(Vec::len).max().unwrap_or(0);
    let mut out = vec![0.0; len];
    for part in parts {
        for (slot, sample) in out.iter_mut().zip(part.iter()) {
            *slot += sample;
        }
    }
    out
}

#[test]
fn ultrasonic_peak_publishes_after_dwell_and_not_before() {
    let mut pipeline = pipeline();
    let start = Instant::now();

    // Bin 3413 just under 20 kHz, everything else at -5 dB
    let frame = frame_with_peaks(&[(3413, -0.2)], -5.0);
    let expected_hz = (3413u64 * 48_000 / 8192) as u32;

    // 180 ms dwell at 50 ms ticks: ticks 0..=3 stay unset, tick 4 publishes
    for i in 0..4u32 {
        let update = pipeline.process_frame(frame.clone(), start + TICK * i);
        assert_eq!(
            update.primary_hz, None,
            "Tick {} published before the dwell elapsed",
            i
        );
    }
    let update = pipeline.process_frame(frame.clone(), start + TICK * 4);
    assert_eq!(update.primary_hz, Some(expected_hz));
}

#[test]
fn published_peak_holds_while_a_new_tone_earns_its_dwell() {
    let mut pipeline = pipeline();
    let start = Instant::now();

    let first = frame_with_peaks(&[(3413, -0.2)], -5.0);
    let second = frame_with_peaks(&[(1000, -0.2)], -5.0);
    let first_hz = (3413u64 * 48_000 / 8192) as u32;
    let second_hz = (1000u64 * 48_000 / 8192) as u32;

    for i in 0..5u32 {
        pipeline.process_frame(first.clone(), start + TICK * i);
    }

    // The tone moves: the old value stays visible through the new dwell
    for i in 5..9u32 {
        let update = pipeline.process_frame(second.clone(), start + TICK * i);
        assert_eq!(
            update.primary_hz,
            Some(first_hz),
            "Output flickered at tick {}",
            i
        );
    }
    let update = pipeline.process_frame(second.clone(), start + TICK * 9);
    assert_eq!(update.primary_hz, Some(second_hz));
}

#[test]
fn silence_floor_reports_no_signal() {
    let mut pipeline = pipeline();
    let start = Instant::now();

    // Everything below the -0.5 dB floor: detector sees silence
    let quiet = frame_with_peaks(&[(500, -2.0)], -30.0);
    for i in 0..6u32 {
        let update = pipeline.process_frame(quiet.clone(), start + TICK * i);
        assert_eq!(update.primary_hz, None);
        assert_eq!(update.secondary_hz, None);
    }
}

#[test]
fn secondary_peak_respects_exclusion_and_shorter_dwell() {
    let mut pipeline = pipeline();
    let start = Instant::now();

    // Secondary at bin 2000, well outside the +/-6 bin exclusion zone
    let frame = frame_with_peaks(&[(3413, -0.1), (2000, -0.3)], -5.0);
    let secondary_hz = (2000u64 * 48_000 / 8192) as u32;

    // 120 ms dwell: published at tick 3 (150 ms), one tick before primary
    let mut updates = Vec::new();
    for i in 0..4u32 {
        updates.push(pipeline.process_frame(frame.clone(), start + TICK * i));
    }
    assert_eq!(updates[2].secondary_hz, None);
    assert_eq!(updates[3].secondary_hz, Some(secondary_hz));
    assert_eq!(updates[3].primary_hz, None, "Primary dwell is longer");
}

#[test]
fn time_domain_two_tone_scenario() {
    let mut pipeline = pipeline();
    let start = Instant::now();

    // 1 kHz dominant, 3 kHz secondary (bin 512 exactly)
    let audio = mix(&[
        sine(1000.0, 0.8, BUFFER_SIZE),
        sine(3000.0, 0.2, BUFFER_SIZE),
    ]);
    pipeline.push_samples(&audio);

    let mut last = None;
    for i in 0..5u32 {
        last = Some(pipeline.tick(start + TICK * i).unwrap());
    }
    let update = last.unwrap();

    let primary = update.primary_hz.expect("primary published");
    assert!(
        (990..=1010).contains(&primary),
        "Expected ~1 kHz primary, got {}",
        primary
    );
    assert_eq!(update.secondary_hz, Some(3000), "3 kHz sits exactly on bin 512");
}

#[test]
fn gesture_away_surfaces_after_its_short_dwell() {
    let mut pipeline = pipeline();
    let start = Instant::now();
    pipeline.set_probe(18_000.0);

    let config = AnalyzerConfig::default();
    let to_bin = |hz: f32| (hz * BUFFER_SIZE as f32 / SAMPLE_RATE as f32) as usize;
    let left_band: Vec<usize> = (to_bin(18_000.0 - config.gesture.band_offset_hz - config.gesture.band_width_hz)
        ..to_bin(18_000.0 - config.gesture.band_offset_hz))
        .collect();

    // Left sideband rises 3 dB per tick: raw "away" from the second tick on
    let mut updates = Vec::new();
    for i in 0..4u32 {
        let boost = 3.0 * i as f32;
        let peaks: Vec<(usize, f32)> = left_band.iter().map(|&b| (b, -40.0 + boost)).collect();
        let frame = frame_with_peaks(&peaks, -40.0);
        updates.push(pipeline.process_frame(frame, start + TICK * i));
    }

    // 100 ms gesture dwell at 50 ms ticks: surfaced on the third raw "away"
    assert_eq!(updates[0].gesture, Gesture::None, "Baseline tick");
    assert_eq!(updates[1].gesture, Gesture::None, "Dwell not yet met");
    assert_eq!(updates[2].gesture, Gesture::None, "Dwell not yet met");
    assert_eq!(updates[3].gesture, Gesture::Away);
}

#[test]
fn probe_retune_round_trip_clears_baseline() {
    let mut pipeline = pipeline();
    let start = Instant::now();
    pipeline.set_probe(18_000.0);

    // Establish a baseline at 18 kHz
    let flat = frame_with_peaks(&[], -40.0);
    pipeline.process_frame(flat.clone(), start);

    // Retune: the very next tick must not fire a gesture, even with a frame
    // that is loud relative to the old baseline
    pipeline.set_probe(19_000.0);
    let config = AnalyzerConfig::default();
    let to_bin = |hz: f32| (hz * BUFFER_SIZE as f32 / SAMPLE_RATE as f32) as usize;
    let new_left: Vec<(usize, f32)> = (to_bin(19_000.0
        - config.gesture.band_offset_hz
        - config.gesture.band_width_hz)
        ..to_bin(19_000.0 - config.gesture.band_offset_hz))
        .map(|b| (b, -10.0))
        .collect();
    let loud = frame_with_peaks(&new_left, -40.0);

    let update = pipeline.process_frame(loud, start + TICK);
    assert_eq!(
        update.gesture,
        Gesture::None,
        "Stale baseline leaked across the probe change"
    );
}

#[test]
fn gesture_stays_none_without_probe() {
    let mut pipeline = pipeline();
    let start = Instant::now();

    let frame = frame_with_peaks(&[(3072, -0.2)], -30.0);
    for i in 0..10u32 {
        let update = pipeline.process_frame(frame.clone(), start + TICK * i);
        assert_eq!(update.gesture, Gesture::None);
    }
}
