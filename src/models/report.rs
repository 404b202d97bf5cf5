use serde::{Deserialize, Serialize};

use super::event::Event;

/// Clinical AHI severity band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AhiSeverity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl AhiSeverity {
    /// Bands: <5 normal, [5,15) mild, [15,30) moderate, >=30 severe.
    pub fn from_score(ahi: f64) -> Self {
        if ahi < 5.0 {
            AhiSeverity::Normal
        } else if ahi < 15.0 {
            AhiSeverity::Mild
        } else if ahi < 30.0 {
            AhiSeverity::Moderate
        } else {
            AhiSeverity::Severe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AhiSeverity::Normal => "Normal",
            AhiSeverity::Mild => "Mild",
            AhiSeverity::Moderate => "Moderate",
            AhiSeverity::Severe => "Severe",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AhiSeverity::Normal => "green",
            AhiSeverity::Mild => "yellow",
            AhiSeverity::Moderate => "orange",
            AhiSeverity::Severe => "red",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsPerHour {
    pub apnea_per_hour: f64,
    pub hypopnea_per_hour: f64,
}

/// Score and summary statistics. Reported values are rounded for display;
/// severity is banded on the unrounded score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AhiSummary {
    pub ahi_score: f64,
    pub severity: AhiSeverity,
    pub severity_color: String,
    pub total_events: usize,
    pub apnea_count: usize,
    pub hypopnea_count: usize,
    pub recording_duration_hours: f64,
    pub total_event_duration_minutes: f64,
    pub event_percentage: f64,
    pub avg_apnea_duration: f64,
    pub avg_hypopnea_duration: f64,
    pub events_per_hour_breakdown: EventsPerHour,
}

/// Everything that shaped a run, echoed back with the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisParameters {
    pub apnea_threshold: f64,
    pub hypopnea_min_threshold: f64,
    pub hypopnea_max_threshold: f64,
    pub spo2_drop_threshold: f64,
    pub min_event_duration: f64,
    pub global_baseline: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_duration_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_minutes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_chunks: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub ahi_analysis: AhiSummary,
    pub apnea_events: Vec<Event>,
    pub hypopnea_events: Vec<Event>,
    /// Both event types, ordered by start time
    pub all_events: Vec<Event>,
    pub analysis_parameters: AnalysisParameters,
}
