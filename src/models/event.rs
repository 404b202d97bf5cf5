use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Apnea,
    Hypopnea,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Moderate,
    Severe,
}

/// SpO2 evidence that promoted a hypopnea candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Desaturation {
    pub spo2_drop: f64,
    pub baseline_spo2: f64,
    pub min_spo2: f64,
}

/// A detected respiratory event with recording-absolute timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Flow sample indices within the window the event was detected in
    pub start_sample: usize,
    pub end_sample: usize,
    pub start_time_s: f64,
    pub end_time_s: f64,
    pub duration_s: f64,
    pub severity: EventSeverity,
    #[serde(flatten)]
    pub desaturation: Option<Desaturation>,
}

impl Event {
    /// Seconds of `other` that fall inside this event.
    pub fn overlap_secs(&self, other: &Event) -> f64 {
        let start = self.start_time_s.max(other.start_time_s);
        let end = self.end_time_s.min(other.end_time_s);
        (end - start).max(0.0)
    }

    pub fn span_secs(&self) -> f64 {
        self.end_time_s - self.start_time_s
    }
}
