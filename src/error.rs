use thiserror::Error;

/// Failures the detection core reports to its caller.
///
/// Empty corroboration windows and out-of-range derived indices are handled
/// locally (skip and clamp) and never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("degenerate flow baseline ({0}); thresholds would classify the whole recording")]
    DegenerateBaseline(f64),
    #[error("chunk worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
