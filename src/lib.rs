//! Apnea/hypopnea detection and AHI scoring for overnight polysomnography.
//!
//! The core takes a flow channel and an SpO2 channel as plain sample arrays
//! with their rates, estimates a recording-wide flow baseline, detects events
//! in one or more overlapping windows, deduplicates across windows, and
//! scores the result. File parsing happens upstream; the binary only reads a
//! JSON request and prints a JSON result.

pub mod analysis;
pub mod error;
pub mod models;
pub mod request;
pub mod settings;
mod utils;

pub use analysis::{
    analyze, analyze_concurrent, analyze_with, detect_events, estimate_baseline,
    AnalysisOptions, ChunkingConfig, DetectionConfig,
};
pub use error::AnalysisError;
pub use models::{AhiSeverity, AnalysisResult, Event, EventKind, EventSeverity};

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use request::AnalysisRequest;
use settings::SettingsStore;

/// Environment variable naming an optional settings JSON file.
pub const SETTINGS_ENV: &str = "AHI_SETTINGS";

pub fn run() -> ExitCode {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match execute(&args) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("[ERROR] AHI analysis failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: &[String]) -> Result<String> {
    let [source] = args else {
        bail!("Usage: ahi-analyzer <request.json | ->");
    };

    let request = read_request(source)?;
    let settings = match std::env::var_os(SETTINGS_ENV) {
        Some(path) => SettingsStore::new(PathBuf::from(path))?.settings(),
        None => Default::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start analysis runtime")?;
    let result = runtime.block_on(request.run(&settings))?;

    log::info!("analysis completed successfully");
    serde_json::to_string(&result).context("Failed to serialize analysis result")
}

fn read_request(source: &str) -> Result<AnalysisRequest> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("Failed to read request from stdin")?;
        AnalysisRequest::from_reader(input.as_bytes())
    } else {
        let file = std::fs::File::open(source)
            .with_context(|| format!("Failed to open request {source}"))?;
        AnalysisRequest::from_reader(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_without_exactly_one_argument() {
        assert!(execute(&[]).is_err());
        assert!(execute(&["a".into(), "b".into()]).is_err());
    }

    #[test]
    fn request_file_round_trips_to_result_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        let mut flow = vec![1.0; 600];
        flow.extend(vec![0.0; 150]);
        flow.extend(vec![1.0; 600]);
        let request = serde_json::json!({
            "flow_data": flow,
            "spo2_data": vec![97.0; 135],
            "flow_sample_rate": 10.0,
            "spo2_sample_rate": 1.0,
        });
        std::fs::write(&path, request.to_string()).unwrap();

        let json = execute(&[path.to_string_lossy().into_owned()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ahi_analysis"]["apnea_count"], 1);
        assert_eq!(value["all_events"][0]["type"], "apnea");
        assert_eq!(value["analysis_parameters"]["min_event_duration"], 10.0);
    }

    #[test]
    fn missing_request_file_is_reported() {
        let err = execute(&["/nonexistent/request.json".into()]).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open request"));
    }
}
