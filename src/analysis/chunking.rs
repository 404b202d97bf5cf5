use std::ops::Range;

use crate::analysis::config::ChunkingConfig;
use crate::analysis::detector::seconds_to_index;
use crate::error::{AnalysisError, Result};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// One time window of the recording. Ranges index into the full flow and
/// SpO2 arrays; nothing is copied.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub index: usize,
    pub flow_range: Range<usize>,
    pub spo2_range: Range<usize>,
    pub start_time_s: f64,
    pub end_time_s: f64,
}

/// Overlapping windows covering a recording end to end.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
}

impl ChunkPlan {
    /// A single window spanning both channels in full. Single-pass analysis
    /// and any chunked run that needs only one window both use this.
    pub fn whole(flow_len: usize, spo2_len: usize, flow_rate: f64) -> Self {
        Self {
            chunks: vec![Chunk {
                index: 0,
                flow_range: 0..flow_len,
                spo2_range: 0..spo2_len,
                start_time_s: 0.0,
                end_time_s: flow_len as f64 / flow_rate,
            }],
        }
    }

    /// Split `flow_len` flow samples into windows of `chunk_duration_minutes`
    /// that overlap by `overlap_minutes`. SpO2 ranges are derived from each
    /// window's elapsed-time span through the SpO2 rate.
    pub fn new(
        chunking: &ChunkingConfig,
        flow_len: usize,
        spo2_len: usize,
        flow_rate: f64,
        spo2_rate: f64,
    ) -> Result<Self> {
        chunking.validate()?;

        let chunk_size = (chunking.chunk_duration_minutes * 60.0 * flow_rate).floor() as usize;
        let overlap_size = (chunking.overlap_minutes * 60.0 * flow_rate).floor() as usize;
        if chunk_size == 0 {
            return Err(AnalysisError::Configuration(format!(
                "chunk of {} minutes holds no flow samples at {}Hz",
                chunking.chunk_duration_minutes, flow_rate
            )));
        }
        if overlap_size >= chunk_size {
            log_warn!(
                "overlap ({} samples) is not shorter than the chunk ({} samples); using one chunk",
                overlap_size,
                chunk_size
            );
        }

        let count = chunk_count(flow_len, chunk_size, overlap_size);
        if count == 1 {
            return Ok(Self::whole(flow_len, spo2_len, flow_rate));
        }

        let step = chunk_size - overlap_size;
        let chunks = (0..count)
            .map(|index| {
                let flow_start = index * step;
                let flow_end = (flow_start + chunk_size).min(flow_len);
                let start_time_s = flow_start as f64 / flow_rate;
                let end_time_s = flow_end as f64 / flow_rate;
                let spo2_start = seconds_to_index(start_time_s, spo2_rate, spo2_len);
                let spo2_end = seconds_to_index(end_time_s, spo2_rate, spo2_len).max(spo2_start);

                log_debug!(
                    "chunk {}/{}: flow[{}:{}] spo2[{}:{}] time[{:.1}s:{:.1}s]",
                    index + 1,
                    count,
                    flow_start,
                    flow_end,
                    spo2_start,
                    spo2_end,
                    start_time_s,
                    end_time_s
                );

                Chunk {
                    index,
                    flow_range: flow_start..flow_end,
                    spo2_range: spo2_start..spo2_end,
                    start_time_s,
                    end_time_s,
                }
            })
            .collect();

        Ok(Self { chunks })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// `ceil((total - chunk) / (chunk - overlap)) + 1`, at least one. An overlap
/// that swallows the whole chunk leaves no forward step, so it collapses to a
/// single window.
pub fn chunk_count(total_samples: usize, chunk_size: usize, overlap_size: usize) -> usize {
    if overlap_size >= chunk_size || total_samples <= chunk_size {
        return 1;
    }
    let step = chunk_size - overlap_size;
    (total_samples - chunk_size).div_ceil(step) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(chunk: f64, overlap: f64) -> ChunkingConfig {
        ChunkingConfig {
            chunk_duration_minutes: chunk,
            overlap_minutes: overlap,
        }
    }

    #[test]
    fn count_covers_the_tail() {
        assert_eq!(chunk_count(100, 30, 5), 4);
        assert_eq!(chunk_count(105, 30, 5), 4);
        assert_eq!(chunk_count(106, 30, 5), 5);
        assert_eq!(chunk_count(30, 30, 5), 1);
        assert_eq!(chunk_count(10, 30, 5), 1);
    }

    #[test]
    fn overlap_not_shorter_than_chunk_is_one_chunk() {
        assert_eq!(chunk_count(1000, 30, 30), 1);
        assert_eq!(chunk_count(1000, 30, 45), 1);
    }

    #[test]
    fn windows_overlap_and_reach_the_end() {
        // 1 Hz flow, 10 min chunks with 2 min overlap over 25 min
        let plan = ChunkPlan::new(&minutes(10.0, 2.0), 1500, 1500, 1.0, 1.0).unwrap();
        let ranges: Vec<_> = plan.chunks().iter().map(|c| c.flow_range.clone()).collect();
        assert_eq!(ranges, vec![0..600, 480..1080, 960..1500]);
        assert_eq!(plan.chunks()[1].start_time_s, 480.0);
        assert_eq!(plan.chunks()[2].end_time_s, 1500.0);
    }

    #[test]
    fn spo2_ranges_follow_elapsed_time_not_sample_ratio() {
        // flow at 25 Hz, SpO2 at 3 Hz
        let plan = ChunkPlan::new(&minutes(1.0, 0.5), 25 * 150, 3 * 150, 25.0, 3.0).unwrap();
        assert_eq!(plan.len(), 4);
        let second = &plan.chunks()[1];
        assert_eq!(second.flow_range, 750..2250);
        assert_eq!(second.spo2_range, 90..270);
        let last = &plan.chunks()[3];
        assert_eq!(last.spo2_range.end, 450);
    }

    #[test]
    fn spo2_range_is_clamped_to_available_samples() {
        let plan = ChunkPlan::new(&minutes(1.0, 0.0), 240, 100, 1.0, 1.0).unwrap();
        let ranges: Vec<_> = plan.chunks().iter().map(|c| c.spo2_range.clone()).collect();
        assert_eq!(ranges, vec![0..60, 60..100, 100..100, 100..100]);
    }

    #[test]
    fn short_recording_is_the_whole_plan() {
        let plan = ChunkPlan::new(&ChunkingConfig::default(), 1000, 40, 25.0, 1.0).unwrap();
        assert_eq!(plan, ChunkPlan::whole(1000, 40, 25.0));
        assert_eq!(plan.chunks()[0].spo2_range, 0..40);
    }

    #[test]
    fn degenerate_overlap_falls_back_to_whole() {
        let plan = ChunkPlan::new(&minutes(1.0, 5.0), 10_000, 400, 25.0, 1.0).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.chunks()[0].flow_range, 0..10_000);
    }

    #[test]
    fn chunk_without_samples_is_rejected() {
        let result = ChunkPlan::new(&minutes(0.001, 0.0), 1000, 1000, 1.0, 1.0);
        assert!(matches!(result, Err(AnalysisError::Configuration(_))));
    }
}
