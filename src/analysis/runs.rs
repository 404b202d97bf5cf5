/// A closed interval of consecutive samples satisfying a predicate.
/// `end_index` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRun {
    pub start_index: usize,
    pub end_index: usize,
    pub duration_s: f64,
}

impl SampleRun {
    /// Start and end in seconds relative to the first sample.
    pub fn span_secs(&self, sample_rate: f64) -> (f64, f64) {
        (
            self.start_index as f64 / sample_rate,
            self.end_index as f64 / sample_rate,
        )
    }
}

/// Single left-to-right scan over a predicate, yielding each maximal run of
/// `true` samples. A run still open when the input ends is closed at the
/// input length.
pub struct Runs<I> {
    predicate: std::iter::Enumerate<I>,
    sample_rate: f64,
    len: usize,
}

impl<I: Iterator<Item = bool>> Iterator for Runs<I> {
    type Item = SampleRun;

    fn next(&mut self) -> Option<SampleRun> {
        let rate = self.sample_rate;
        let mut start = None;
        for (i, hit) in self.predicate.by_ref() {
            self.len = i + 1;
            match (hit, start) {
                (true, None) => start = Some(i),
                (false, Some(s)) => return Some(close(s, i, rate)),
                _ => {}
            }
        }
        start.map(|s| close(s, self.len, rate))
    }
}

fn close(start_index: usize, end_index: usize, sample_rate: f64) -> SampleRun {
    SampleRun {
        start_index,
        end_index,
        duration_s: (end_index - start_index) as f64 / sample_rate,
    }
}

/// Every maximal run of the predicate, regardless of duration.
pub fn runs<P>(predicate: P, sample_rate: f64) -> Runs<P::IntoIter>
where
    P: IntoIterator<Item = bool>,
{
    Runs {
        predicate: predicate.into_iter().enumerate(),
        sample_rate,
        len: 0,
    }
}

/// Runs lasting at least `min_duration_s`, in order of appearance.
pub fn extract_runs<P>(
    predicate: P,
    sample_rate: f64,
    min_duration_s: f64,
) -> impl Iterator<Item = SampleRun>
where
    P: IntoIterator<Item = bool>,
{
    runs(predicate, sample_rate).filter(move |run| run.duration_s >= min_duration_s)
}
