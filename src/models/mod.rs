pub mod event;
pub mod report;

pub use event::{Desaturation, Event, EventKind, EventSeverity};
pub use report::{AhiSeverity, AhiSummary, AnalysisParameters, AnalysisResult, EventsPerHour};
