use crate::analysis::config::validate_sample_rate;
use crate::error::{AnalysisError, Result};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Reference "normal breathing" amplitude for a whole recording.
///
/// Takes |flow|, keeps the values at or above its median, and returns the
/// median of that upper half. Events drag the lower half down, so the upper
/// half tracks the patient's unobstructed amplitude even on event-heavy
/// nights.
pub fn estimate_baseline(flow: &[f64], flow_rate: f64) -> Result<f64> {
    validate_sample_rate("flow", flow_rate)?;
    if flow.is_empty() {
        return Err(AnalysisError::Configuration(
            "cannot estimate a baseline from an empty flow signal".into(),
        ));
    }

    let mut magnitude: Vec<f64> = flow.iter().map(|v| v.abs()).collect();
    magnitude.sort_by(f64::total_cmp);

    let p50 = percentile_sorted(&magnitude, 50.0);
    let start = magnitude.partition_point(|&v| v < p50);
    let baseline = median_sorted(&magnitude[start..]);

    log_info!(
        "baseline flow {:.3} from {} samples @ {}Hz",
        baseline,
        flow.len(),
        flow_rate
    );
    check_baseline(baseline)
}

/// Accepts a baseline only if it can scale thresholds meaningfully.
pub fn check_baseline(baseline: f64) -> Result<f64> {
    if baseline.is_finite() && baseline > 0.0 {
        Ok(baseline)
    } else {
        Err(AnalysisError::DegenerateBaseline(baseline))
    }
}

/// Linear-interpolated percentile of ascending data.
pub(crate) fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

pub(crate) fn median_sorted(sorted: &[f64]) -> f64 {
    percentile_sorted(sorted, 50.0)
}

/// Median of unsorted data; NaN for an empty slice.
pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    median_sorted(&sorted)
}
