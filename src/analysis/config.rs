use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Clinical thresholds and smoothing parameters for event detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Apnea when smoothed |flow| drops below this fraction of baseline (90% reduction)
    pub apnea_threshold_fraction: f64,

    /// Hypopnea flow band, inclusive on both ends, as fractions of baseline
    pub hypopnea_min_fraction: f64,
    pub hypopnea_max_fraction: f64,

    /// Minimum SpO2 desaturation (percentage points) to confirm a hypopnea
    pub spo2_drop_threshold: f64,

    pub min_event_duration_s: f64,

    /// Apneas longer than this are graded severe
    pub apnea_severe_duration_s: f64,
    /// Hypopneas desaturating more than this are graded severe
    pub hypopnea_severe_drop: f64,

    /// Moving-average widths in seconds
    pub flow_smoothing_s: f64,
    pub spo2_smoothing_s: f64,

    /// SpO2 lookback/lookahead around a hypopnea candidate
    pub desaturation_window_s: f64,

    /// Events of the same type overlapping by at least this fraction of the
    /// longer one are the same event seen from two chunks
    pub duplicate_overlap_fraction: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            apnea_threshold_fraction: 0.10,
            hypopnea_min_fraction: 0.30,
            hypopnea_max_fraction: 0.70,
            spo2_drop_threshold: 3.0,
            min_event_duration_s: 10.0,
            apnea_severe_duration_s: 30.0,
            hypopnea_severe_drop: 6.0,
            flow_smoothing_s: 2.0,
            spo2_smoothing_s: 3.0,
            desaturation_window_s: 30.0,
            duplicate_overlap_fraction: 0.5,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("apnea_threshold_fraction", self.apnea_threshold_fraction),
            ("hypopnea_min_fraction", self.hypopnea_min_fraction),
            ("hypopnea_max_fraction", self.hypopnea_max_fraction),
            ("spo2_drop_threshold", self.spo2_drop_threshold),
            ("min_event_duration_s", self.min_event_duration_s),
            ("apnea_severe_duration_s", self.apnea_severe_duration_s),
            ("hypopnea_severe_drop", self.hypopnea_severe_drop),
            ("flow_smoothing_s", self.flow_smoothing_s),
            ("spo2_smoothing_s", self.spo2_smoothing_s),
            ("desaturation_window_s", self.desaturation_window_s),
            ("duplicate_overlap_fraction", self.duplicate_overlap_fraction),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::Configuration(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if self.min_event_duration_s <= 0.0 {
            return Err(AnalysisError::Configuration(
                "min_event_duration_s must be positive".into(),
            ));
        }
        if self.hypopnea_min_fraction > self.hypopnea_max_fraction {
            return Err(AnalysisError::Configuration(format!(
                "hypopnea band is inverted: [{}, {}]",
                self.hypopnea_min_fraction, self.hypopnea_max_fraction
            )));
        }
        if self.duplicate_overlap_fraction > 1.0 {
            return Err(AnalysisError::Configuration(
                "duplicate_overlap_fraction must not exceed 1.0".into(),
            ));
        }
        Ok(())
    }
}

/// Window layout for chunked analysis of long recordings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_duration_minutes: f64,
    pub overlap_minutes: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_duration_minutes: 30.0,
            overlap_minutes: 2.0,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.chunk_duration_minutes.is_finite() || self.chunk_duration_minutes <= 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "chunk_duration_minutes must be positive, got {}",
                self.chunk_duration_minutes
            )));
        }
        if !self.overlap_minutes.is_finite() || self.overlap_minutes < 0.0 {
            return Err(AnalysisError::Configuration(format!(
                "overlap_minutes must be non-negative, got {}",
                self.overlap_minutes
            )));
        }
        Ok(())
    }
}

/// Per-run choices layered over the clinical thresholds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOptions {
    pub detection: DetectionConfig,
    /// None analyzes the recording as one window
    pub chunking: Option<ChunkingConfig>,
    /// Precomputed flow baseline; estimated from the recording when absent
    pub baseline: Option<f64>,
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        if let Some(chunking) = &self.chunking {
            chunking.validate()?;
        }
        Ok(())
    }
}

/// Rejects sample rates that cannot map samples to elapsed time.
pub fn validate_sample_rate(channel: &str, rate: f64) -> Result<()> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(AnalysisError::Configuration(format!(
            "{channel} sample rate must be positive, got {rate}"
        )))
    }
}
