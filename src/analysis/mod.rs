pub mod algorithm;
pub mod baseline;
pub mod chunking;
pub mod config;
pub mod detector;
pub mod merge;
pub mod runs;
pub mod scoring;
pub mod smoothing;

pub use algorithm::{analyze, analyze_concurrent, analyze_with};
pub use baseline::estimate_baseline;
pub use config::{AnalysisOptions, ChunkingConfig, DetectionConfig};
pub use detector::detect_events;
