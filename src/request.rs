use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::sync::Arc;

use crate::analysis::{analyze_concurrent, AnalysisOptions, ChunkingConfig};
use crate::models::AnalysisResult;
use crate::settings::AnalysisSettings;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Analysis input handed over by the recording loader: both channels, their
/// rates, and optional chunking and baseline choices.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub flow_data: Vec<f64>,
    pub spo2_data: Vec<f64>,
    pub flow_sample_rate: f64,
    pub spo2_sample_rate: f64,
    #[serde(default)]
    pub global_baseline: Option<f64>,
    #[serde(default)]
    pub chunk_duration_minutes: Option<f64>,
    #[serde(default)]
    pub overlap_minutes: Option<f64>,
}

impl AnalysisRequest {
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).context("Malformed analysis request")
    }

    /// Request chunk fields win; either one alone switches to chunked mode
    /// with the other taken from `fallback` or the defaults.
    pub fn chunking(&self, fallback: Option<&ChunkingConfig>) -> Option<ChunkingConfig> {
        if self.chunk_duration_minutes.is_none() && self.overlap_minutes.is_none() {
            return fallback.cloned();
        }
        let base = fallback.cloned().unwrap_or_default();
        Some(ChunkingConfig {
            chunk_duration_minutes: self
                .chunk_duration_minutes
                .unwrap_or(base.chunk_duration_minutes),
            overlap_minutes: self.overlap_minutes.unwrap_or(base.overlap_minutes),
        })
    }

    pub fn options(&self, settings: &AnalysisSettings) -> AnalysisOptions {
        AnalysisOptions {
            detection: settings.detection.clone(),
            chunking: self.chunking(settings.chunking.as_ref()),
            baseline: self.global_baseline,
        }
    }

    /// Run the request, fanning chunks out over the runtime's blocking pool.
    pub async fn run(self, settings: &AnalysisSettings) -> Result<AnalysisResult> {
        let options = self.options(settings);
        log_info!(
            "request: {} flow samples, {} spo2 samples, chunking {:?}",
            self.flow_data.len(),
            self.spo2_data.len(),
            options.chunking
        );

        let result = analyze_concurrent(
            Arc::from(self.flow_data),
            Arc::from(self.spo2_data),
            self.flow_sample_rate,
            self.spo2_sample_rate,
            options,
        )
        .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> AnalysisRequest {
        AnalysisRequest::from_reader(json.as_bytes()).unwrap()
    }

    #[test]
    fn plain_request_is_single_pass() {
        let req = request(
            r#"{"flow_data":[1.0],"spo2_data":[97.0],"flow_sample_rate":25,"spo2_sample_rate":1}"#,
        );
        assert_eq!(req.chunking(None), None);
        assert_eq!(req.global_baseline, None);
    }

    #[test]
    fn one_chunk_field_enables_chunking() {
        let req = request(
            r#"{"flow_data":[],"spo2_data":[],"flow_sample_rate":25,"spo2_sample_rate":1,
                "overlap_minutes":5}"#,
        );
        assert_eq!(
            req.chunking(None),
            Some(ChunkingConfig {
                chunk_duration_minutes: 30.0,
                overlap_minutes: 5.0,
            })
        );
    }

    #[test]
    fn settings_chunking_applies_when_request_is_silent() {
        let req = request(
            r#"{"flow_data":[],"spo2_data":[],"flow_sample_rate":25,"spo2_sample_rate":1,
                "global_baseline":0.8}"#,
        );
        let settings = AnalysisSettings {
            chunking: Some(ChunkingConfig {
                chunk_duration_minutes: 60.0,
                overlap_minutes: 3.0,
            }),
            ..AnalysisSettings::default()
        };
        let options = req.options(&settings);
        assert_eq!(options.chunking, settings.chunking);
        assert_eq!(options.baseline, Some(0.8));
    }

    #[test]
    fn missing_channel_is_rejected() {
        let result = AnalysisRequest::from_reader(r#"{"flow_data":[1.0]}"#.as_bytes());
        assert!(result.is_err());
    }
}
