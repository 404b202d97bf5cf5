use crate::analysis::baseline::{check_baseline, median};
use crate::analysis::config::{validate_sample_rate, DetectionConfig};
use crate::analysis::runs::{extract_runs, SampleRun};
use crate::analysis::smoothing::{moving_average, smoothed_amplitude, window_size};
use crate::error::Result;
use crate::models::{Desaturation, Event, EventKind, EventSeverity};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Events found in one time window, split by type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowEvents {
    pub apneas: Vec<Event>,
    pub hypopneas: Vec<Event>,
}

impl WindowEvents {
    pub fn into_events(self) -> Vec<Event> {
        let mut events = self.apneas;
        events.extend(self.hypopneas);
        events
    }
}

/// Detect apneas and hypopneas in one window of a recording.
///
/// `baseline` is the recording-wide flow reference and is never recomputed
/// here. `time_offset_s` is the window's start within the recording, so the
/// returned events carry recording-absolute times. Apneas come first, then
/// hypopneas, each in start order.
pub fn detect_events(
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    baseline: f64,
    time_offset_s: f64,
    config: &DetectionConfig,
) -> Result<Vec<Event>> {
    detect_window(flow, spo2, flow_rate, spo2_rate, baseline, time_offset_s, config)
        .map(WindowEvents::into_events)
}

pub(crate) fn detect_window(
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    baseline: f64,
    time_offset_s: f64,
    config: &DetectionConfig,
) -> Result<WindowEvents> {
    validate_sample_rate("flow", flow_rate)?;
    validate_sample_rate("spo2", spo2_rate)?;
    let baseline = check_baseline(baseline)?;

    if flow.is_empty() {
        return Ok(WindowEvents::default());
    }

    let flow_window = window_size(config.flow_smoothing_s, flow_rate, flow.len());
    log_debug!(
        "flow smoothing width {} samples over {} samples",
        flow_window,
        flow.len()
    );
    let amplitude = smoothed_amplitude(flow, flow_window);

    let apneas = detect_apneas(&amplitude, flow_rate, baseline, time_offset_s, config);
    let hypopneas = detect_hypopneas(
        &amplitude,
        spo2,
        flow_rate,
        spo2_rate,
        baseline,
        time_offset_s,
        config,
    );

    Ok(WindowEvents { apneas, hypopneas })
}

/// Near-cessation of flow: smoothed amplitude strictly below the apnea
/// fraction of baseline.
fn detect_apneas(
    amplitude: &[f64],
    flow_rate: f64,
    baseline: f64,
    time_offset_s: f64,
    config: &DetectionConfig,
) -> Vec<Event> {
    let threshold = baseline * config.apnea_threshold_fraction;
    log_debug!(
        "apnea threshold {:.3} ({:.0}% of baseline {:.3})",
        threshold,
        config.apnea_threshold_fraction * 100.0,
        baseline
    );

    let below = amplitude.iter().map(|&v| v < threshold);
    let events: Vec<Event> = extract_runs(below, flow_rate, config.min_event_duration_s)
        .map(|run| {
            let severity = if run.duration_s > config.apnea_severe_duration_s {
                EventSeverity::Severe
            } else {
                EventSeverity::Moderate
            };
            event_from_run(EventKind::Apnea, &run, flow_rate, time_offset_s, severity, None)
        })
        .collect();

    log_info!("detected {} apnea events", events.len());
    events
}

/// Partial flow reduction inside the hypopnea band, kept only when SpO2
/// corroborates it with a large enough desaturation.
fn detect_hypopneas(
    amplitude: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    baseline: f64,
    time_offset_s: f64,
    config: &DetectionConfig,
) -> Vec<Event> {
    if spo2.is_empty() {
        log_debug!("no SpO2 samples in window; skipping hypopnea detection");
        return Vec::new();
    }

    let low = baseline * config.hypopnea_min_fraction;
    let high = baseline * config.hypopnea_max_fraction;

    let spo2_window = window_size(config.spo2_smoothing_s, spo2_rate, spo2.len());
    log_debug!("spo2 smoothing width {} samples", spo2_window);
    let spo2_smooth = moving_average(spo2, spo2_window);

    let reduced = amplitude.iter().map(|&v| v >= low && v <= high);
    let candidates: Vec<SampleRun> =
        extract_runs(reduced, flow_rate, config.min_event_duration_s).collect();

    let events: Vec<Event> = candidates
        .iter()
        .filter_map(|run| {
            let desaturation = corroborate(run, &spo2_smooth, flow_rate, spo2_rate, config)?;
            if desaturation.spo2_drop < config.spo2_drop_threshold {
                return None;
            }
            let severity = if desaturation.spo2_drop > config.hypopnea_severe_drop {
                EventSeverity::Severe
            } else {
                EventSeverity::Moderate
            };
            Some(event_from_run(
                EventKind::Hypopnea,
                run,
                flow_rate,
                time_offset_s,
                severity,
                Some(desaturation),
            ))
        })
        .collect();

    log_info!(
        "detected {} hypopnea events from {} flow reductions",
        events.len(),
        candidates.len()
    );
    events
}

/// Measure the SpO2 drop around a flow-reduction candidate.
///
/// The candidate's span is mapped through elapsed seconds into SpO2 indices.
/// Reference level is the median over the preceding window; the nadir is
/// searched from the candidate start through the window after its end.
/// Returns None when either span is empty after clamping.
fn corroborate(
    run: &SampleRun,
    spo2_smooth: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    config: &DetectionConfig,
) -> Option<Desaturation> {
    let len = spo2_smooth.len();
    let (start_s, end_s) = run.span_secs(flow_rate);
    let start = seconds_to_index(start_s, spo2_rate, len);
    let end = seconds_to_index(end_s, spo2_rate, len);
    if end <= start {
        return None;
    }

    let margin = (config.desaturation_window_s * spo2_rate).floor() as usize;
    let before = &spo2_smooth[start.saturating_sub(margin)..start];
    if before.is_empty() {
        log_debug!(
            "hypopnea candidate at {:.1}s has no SpO2 history; unverifiable",
            start_s
        );
        return None;
    }
    let baseline_spo2 = median(before);

    let after_end = (end + margin).min(len);
    let min_spo2 = spo2_smooth[start..after_end]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);

    Some(Desaturation {
        spo2_drop: baseline_spo2 - min_spo2,
        baseline_spo2,
        min_spo2,
    })
}

/// Elapsed seconds to a sample index, clamped into `0..=len`.
pub(crate) fn seconds_to_index(secs: f64, sample_rate: f64, len: usize) -> usize {
    let index = (secs * sample_rate).floor();
    if index <= 0.0 {
        0
    } else {
        (index as usize).min(len)
    }
}

fn event_from_run(
    kind: EventKind,
    run: &SampleRun,
    flow_rate: f64,
    time_offset_s: f64,
    severity: EventSeverity,
    desaturation: Option<Desaturation>,
) -> Event {
    let start_time_s = time_offset_s + run.start_index as f64 / flow_rate;
    Event {
        kind,
        start_sample: run.start_index,
        end_sample: run.end_index,
        start_time_s,
        end_time_s: start_time_s + run.duration_s,
        duration_s: run.duration_s,
        severity,
        desaturation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    const RATE: f64 = 10.0;

    fn flow_segments(segments: &[(f64, f64)]) -> Vec<f64> {
        segments
            .iter()
            .flat_map(|&(level, secs)| {
                std::iter::repeat(level).take((secs * RATE) as usize)
            })
            .collect()
    }

    #[test]
    fn long_apnea_is_graded_severe() {
        let flow = flow_segments(&[(1.0, 30.0), (0.0, 40.0), (1.0, 30.0)]);
        let spo2 = vec![97.0; 100];
        let events =
            detect_events(&flow, &spo2, RATE, 1.0, 1.0, 0.0, &DetectionConfig::default()).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Apnea);
        assert_eq!(events[0].severity, EventSeverity::Severe);
        assert!(events[0].duration_s > 30.0);
    }

    #[test]
    fn time_offset_shifts_event_times_not_samples() {
        let flow = flow_segments(&[(1.0, 20.0), (0.0, 15.0), (1.0, 20.0)]);
        let spo2 = vec![97.0; 55];
        let config = DetectionConfig::default();

        let local = detect_events(&flow, &spo2, RATE, 1.0, 1.0, 0.0, &config).unwrap();
        let shifted = detect_events(&flow, &spo2, RATE, 1.0, 1.0, 600.0, &config).unwrap();

        assert_eq!(local.len(), 1);
        assert_eq!(shifted.len(), 1);
        assert_eq!(local[0].start_sample, shifted[0].start_sample);
        assert!((shifted[0].start_time_s - local[0].start_time_s - 600.0).abs() < 1e-9);
        assert_eq!(local[0].severity, EventSeverity::Moderate);
    }

    #[test]
    fn apnea_threshold_is_strict() {
        // amplitude sits exactly on the threshold: not an apnea
        let config = DetectionConfig {
            apnea_threshold_fraction: 0.5,
            ..DetectionConfig::default()
        };
        let flow = vec![0.5; 300];
        let events = detect_events(&flow, &[], RATE, 1.0, 1.0, 0.0, &config).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn hypopnea_band_is_inclusive_and_needs_desaturation() {
        // 0.75 is exact in binary, so the plateau lands on the band edge
        let config = DetectionConfig {
            hypopnea_max_fraction: 0.75,
            ..DetectionConfig::default()
        };
        let flow = flow_segments(&[(1.0, 40.0), (0.75, 20.0), (1.0, 40.0)]);
        let mut spo2 = vec![97.0; 100];
        for v in &mut spo2[45..70] {
            *v = 90.0;
        }

        let events = detect_events(&flow, &spo2, RATE, 1.0, 1.0, 0.0, &config).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind, EventKind::Hypopnea);
        assert_eq!(event.severity, EventSeverity::Severe);

        let desat = event.desaturation.unwrap();
        assert!((desat.baseline_spo2 - 97.0).abs() < 1e-9);
        assert!((desat.min_spo2 - 90.0).abs() < 1e-9);
        assert!((desat.spo2_drop - 7.0).abs() < 1e-9);
    }

    #[test]
    fn candidate_without_spo2_history_is_discarded() {
        // reduction starts at t=0, so there is no SpO2 before it
        let flow = flow_segments(&[(0.5, 20.0), (1.0, 60.0)]);
        let mut spo2 = vec![90.0; 10];
        spo2.extend(vec![97.0; 70]);

        let events =
            detect_events(&flow, &spo2, RATE, 1.0, 1.0, 0.0, &DetectionConfig::default()).unwrap();
        assert!(events.iter().all(|e| e.kind != EventKind::Hypopnea));
    }

    #[test]
    fn candidate_beyond_spo2_coverage_is_discarded() {
        let flow = flow_segments(&[(1.0, 60.0), (0.5, 20.0), (1.0, 20.0)]);
        // SpO2 stops at 50 s, before the candidate starts
        let spo2 = vec![97.0; 50];

        let events =
            detect_events(&flow, &spo2, RATE, 1.0, 1.0, 0.0, &DetectionConfig::default()).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn degenerate_baseline_is_an_error() {
        let flow = vec![0.0; 200];
        let result = detect_events(&flow, &[], RATE, 1.0, 0.0, 0.0, &DetectionConfig::default());
        assert_eq!(result, Err(AnalysisError::DegenerateBaseline(0.0)));
    }

    #[test]
    fn bad_spo2_rate_is_an_error() {
        let result = detect_events(&[1.0], &[97.0], RATE, 0.0, 1.0, 0.0, &DetectionConfig::default());
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }

    #[test]
    fn seconds_map_through_rate_and_clamp() {
        assert_eq!(seconds_to_index(12.0, 1.0, 100), 12);
        assert_eq!(seconds_to_index(12.9, 1.0, 100), 12);
        assert_eq!(seconds_to_index(2.0, 0.5, 100), 1);
        assert_eq!(seconds_to_index(500.0, 1.0, 100), 100);
        assert_eq!(seconds_to_index(-3.0, 1.0, 100), 0);
    }
}
