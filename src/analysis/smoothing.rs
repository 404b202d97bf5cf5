/// Moving-average width in samples for a signal of `len` samples.
///
/// Targets `round(window_secs * sample_rate)`. A target at least as wide as
/// the data falls back to a quarter of the data so short chunks keep their
/// variance.
pub fn window_size(window_secs: f64, sample_rate: f64, len: usize) -> usize {
    let target = (window_secs * sample_rate).round().max(1.0) as usize;
    if target >= len {
        (len / 4).max(1)
    } else {
        target
    }
}

/// Centered moving average. Windows at the edges shrink to the samples that
/// exist instead of padding, so output[i] is always a mean of real data.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let window = window.max(1);
    if n == 0 {
        return Vec::new();
    }

    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for &v in values {
        acc += v;
        prefix.push(acc);
    }

    let back = window / 2;
    let forward = window - back;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(back);
            let hi = (i + forward).min(n);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

/// Smoothed absolute flow, the amplitude envelope both detectors threshold.
pub fn smoothed_amplitude(flow: &[f64], window: usize) -> Vec<f64> {
    let magnitude: Vec<f64> = flow.iter().map(|v| v.abs()).collect();
    moving_average(&magnitude, window)
}
