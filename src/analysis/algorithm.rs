use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::analysis::baseline::{check_baseline, estimate_baseline};
use crate::analysis::chunking::{Chunk, ChunkPlan};
use crate::analysis::config::{validate_sample_rate, AnalysisOptions, ChunkingConfig};
use crate::analysis::detector::{detect_window, WindowEvents};
use crate::analysis::merge::{remove_duplicates, sort_by_start};
use crate::analysis::scoring::{recording_duration_hours, summarize};
use crate::error::{AnalysisError, Result};
use crate::models::{AnalysisParameters, AnalysisResult};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Analyze a recording with the default clinical thresholds.
///
/// `chunking` of None runs one window over the whole recording; otherwise the
/// flow channel is split into overlapping windows sharing one global baseline.
pub fn analyze(
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    chunking: Option<&ChunkingConfig>,
) -> Result<AnalysisResult> {
    let options = AnalysisOptions {
        chunking: chunking.cloned(),
        ..AnalysisOptions::default()
    };
    analyze_with(flow, spo2, flow_rate, spo2_rate, &options)
}

/// Full pipeline: baseline, per-window detection, dedup, scoring.
pub fn analyze_with(
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    options: &AnalysisOptions,
) -> Result<AnalysisResult> {
    let (baseline, plan) = prepare(flow, spo2, flow_rate, spo2_rate, options)?;

    let mut windows = Vec::with_capacity(plan.len());
    for chunk in plan.chunks() {
        let found = detect_chunk(chunk, flow, spo2, flow_rate, spo2_rate, baseline, options)?;
        windows.push(found);
    }

    Ok(finish(
        windows, flow, spo2, flow_rate, spo2_rate, baseline, &plan, options,
    ))
}

/// Same result as [`analyze_with`], with each chunk detected on the tokio
/// blocking pool. At most one chunk per available core is in flight, so
/// smoothing buffers stay bounded by the chunk size rather than the recording.
/// Chunk results are gathered in chunk order before the single-threaded dedup
/// and scoring pass.
pub async fn analyze_concurrent(
    flow: Arc<[f64]>,
    spo2: Arc<[f64]>,
    flow_rate: f64,
    spo2_rate: f64,
    options: AnalysisOptions,
) -> Result<AnalysisResult> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    analyze_bounded(flow, spo2, flow_rate, spo2_rate, options, workers).await
}

pub(crate) async fn analyze_bounded(
    flow: Arc<[f64]>,
    spo2: Arc<[f64]>,
    flow_rate: f64,
    spo2_rate: f64,
    options: AnalysisOptions,
    max_in_flight: usize,
) -> Result<AnalysisResult> {
    let (baseline, plan) = prepare(&flow, &spo2, flow_rate, spo2_rate, &options)?;
    let options = Arc::new(options);
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    log_debug!("detecting with up to {} chunk worker(s)", max_in_flight.max(1));

    let mut handles = Vec::with_capacity(plan.len());
    for chunk in plan.chunks().iter().cloned() {
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .map_err(|err| AnalysisError::Worker(format!("chunk {}: {err}", chunk.index + 1)))?;
        let flow = Arc::clone(&flow);
        let spo2 = Arc::clone(&spo2);
        let options = Arc::clone(&options);
        handles.push(tokio::task::spawn_blocking(move || {
            let found = detect_chunk(&chunk, &flow, &spo2, flow_rate, spo2_rate, baseline, &options);
            drop(permit);
            found
        }));
    }

    let mut windows = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let found = handle.await.map_err(|err| {
            log_error!("chunk {} worker failed: {err}", index + 1);
            AnalysisError::Worker(format!("chunk {}: {err}", index + 1))
        })??;
        windows.push(found);
    }

    Ok(finish(
        windows, &flow, &spo2, flow_rate, spo2_rate, baseline, &plan, &options,
    ))
}

/// Validate inputs, settle the global baseline, and lay out the windows.
fn prepare(
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    options: &AnalysisOptions,
) -> Result<(f64, ChunkPlan)> {
    options.validate()?;
    validate_sample_rate("flow", flow_rate)?;
    validate_sample_rate("spo2", spo2_rate)?;
    if flow.is_empty() || spo2.is_empty() {
        return Err(AnalysisError::Configuration(format!(
            "recording has zero duration (flow: {} samples, spo2: {} samples)",
            flow.len(),
            spo2.len()
        )));
    }

    log_info!(
        "analyzing flow: {} samples @ {}Hz, spo2: {} samples @ {}Hz",
        flow.len(),
        flow_rate,
        spo2.len(),
        spo2_rate
    );

    let baseline = match options.baseline {
        Some(supplied) => {
            log_info!("using supplied global baseline {:.3}", supplied);
            check_baseline(supplied)?
        }
        None => estimate_baseline(flow, flow_rate)?,
    };

    let plan = match &options.chunking {
        Some(chunking) => ChunkPlan::new(chunking, flow.len(), spo2.len(), flow_rate, spo2_rate)?,
        None => ChunkPlan::whole(flow.len(), spo2.len(), flow_rate),
    };
    log_info!("processing {} chunk(s)", plan.len());

    Ok((baseline, plan))
}

fn detect_chunk(
    chunk: &Chunk,
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    baseline: f64,
    options: &AnalysisOptions,
) -> Result<WindowEvents> {
    let found = detect_window(
        &flow[chunk.flow_range.clone()],
        &spo2[chunk.spo2_range.clone()],
        flow_rate,
        spo2_rate,
        baseline,
        chunk.start_time_s,
        &options.detection,
    )?;
    log_info!(
        "chunk {} [{:.1}s..{:.1}s]: {} apneas, {} hypopneas",
        chunk.index + 1,
        chunk.start_time_s,
        chunk.end_time_s,
        found.apneas.len(),
        found.hypopneas.len()
    );
    Ok(found)
}

#[allow(clippy::too_many_arguments)]
fn finish(
    windows: Vec<WindowEvents>,
    flow: &[f64],
    spo2: &[f64],
    flow_rate: f64,
    spo2_rate: f64,
    baseline: f64,
    plan: &ChunkPlan,
    options: &AnalysisOptions,
) -> AnalysisResult {
    let detection = &options.detection;

    let (apneas, hypopneas) = windows.into_iter().fold(
        (Vec::new(), Vec::new()),
        |(mut apneas, mut hypopneas), window| {
            apneas.extend(window.apneas);
            hypopneas.extend(window.hypopneas);
            (apneas, hypopneas)
        },
    );
    let pooled = (apneas.len(), hypopneas.len());
    let apnea_events = remove_duplicates(apneas, detection.duplicate_overlap_fraction);
    let hypopnea_events = remove_duplicates(hypopneas, detection.duplicate_overlap_fraction);
    log_info!(
        "after deduplication: {} apneas (from {}), {} hypopneas (from {})",
        apnea_events.len(),
        pooled.0,
        hypopnea_events.len(),
        pooled.1
    );

    let hours = recording_duration_hours(flow.len(), flow_rate, spo2.len(), spo2_rate);
    let ahi_analysis = summarize(&apnea_events, &hypopnea_events, hours);
    log_info!(
        "AHI {:.1} ({}) over {:.2}h",
        ahi_analysis.ahi_score,
        ahi_analysis.severity.as_str(),
        hours
    );

    let mut all_events = apnea_events.clone();
    all_events.extend(hypopnea_events.iter().cloned());
    sort_by_start(&mut all_events);

    let chunking = options.chunking.as_ref();
    AnalysisResult {
        ahi_analysis,
        apnea_events,
        hypopnea_events,
        all_events,
        analysis_parameters: AnalysisParameters {
            apnea_threshold: detection.apnea_threshold_fraction,
            hypopnea_min_threshold: detection.hypopnea_min_fraction,
            hypopnea_max_threshold: detection.hypopnea_max_fraction,
            spo2_drop_threshold: detection.spo2_drop_threshold,
            min_event_duration: detection.min_event_duration_s,
            global_baseline: baseline,
            chunk_duration_minutes: chunking.map(|c| c.chunk_duration_minutes),
            overlap_minutes: chunking.map(|c| c.overlap_minutes),
            num_chunks: chunking.map(|_| plan.len()),
        },
    }
}
