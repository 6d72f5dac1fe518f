//! Merging progress from several concurrent streams of work.
//!
//! Each stream declares up front how many steps it will take. The combined
//! ratio is the number of steps completed across *all* streams divided by
//! the sum of their declared totals, so a stream with eight pages weighs
//! four times as much as a stream with two. Averaging the per-stream ratios
//! instead would make a short stream finishing early look like half the
//! work is done.

/// Completed steps out of a declared total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: u64,
    pub total: u64,
}
impl Progress {
    pub fn new(total: u64) -> Self {
        Self { completed: 0, total }
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Ratio of this stream alone, in `[0, 1]`. An empty stream is complete.
    pub fn ratio(&self) -> f64 {
        match self.total {
            0 => 1.0,
            total => self.completed.min(total) as f64 / total as f64,
        }
    }
}

/// Per-stream counters keyed by `K`, combined into one weighted ratio.
///
/// Streams must be registered with their totals before work starts, so
/// that a stream that hasn't reported anything yet still counts towards
/// the denominator.
///
/// ```
/// use folio_asyncutils::ProgressAggregator;
///
/// let mut progress = ProgressAggregator::new([("authors", 2), ("works", 8)]);
/// assert_eq!(progress.update(&"authors", 1), 0.1);
/// assert_eq!(progress.update(&"works", 4), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct ProgressAggregator<K> {
    streams: Vec<(K, Progress)>,
}

impl<K: PartialEq> ProgressAggregator<K> {
    pub fn new(totals: impl IntoIterator<Item = (K, u64)>) -> Self {
        let streams = totals.into_iter().map(|(key, total)| (key, Progress::new(total))).collect();
        Self { streams }
    }

    /// Record that the stream `key` has now completed `completed` steps, and
    /// return the recomputed combined ratio.
    ///
    /// Counts above the stream's declared total are clamped to it. Unknown
    /// keys are ignored.
    pub fn update(&mut self, key: &K, completed: u64) -> f64 {
        if let Some((_, progress)) = self.streams.iter_mut().find(|(k, _)| k == key) {
            progress.completed = completed.min(progress.total);
        }
        self.ratio()
    }

    /// Combined ratio in `[0, 1]`. With nothing to do, everything is done.
    pub fn ratio(&self) -> f64 {
        let (completed, total) = self.totals();
        match total {
            0 => 1.0,
            total => completed as f64 / total as f64,
        }
    }

    /// Completed and declared steps summed across every stream, saturating at
    /// `u64::MAX`.
    pub fn totals(&self) -> (u64, u64) {
        self.streams.iter().fold((0, 0), |(completed, total), (_, progress)| {
            (completed.saturating_add(progress.completed), total.saturating_add(progress.total))
        })
    }

    pub fn get(&self, key: &K) -> Option<Progress> {
        self.streams.iter().find(|(k, _)| k == key).map(|(_, progress)| *progress)
    }

    pub fn is_complete(&self) -> bool {
        self.streams.iter().all(|(_, progress)| progress.is_complete())
    }
}
