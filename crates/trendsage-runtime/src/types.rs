//! Runtime types.

use std::path::PathBuf;

use chrono::NaiveDate;
use trendsage_report::RenderOutcome;
use trendsage_store::DailyStats;

/// Where a batch run ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No review file for the date; nothing was written.
    NoData,
    /// Chunks are being extracted and resolved.
    Processing,
    /// Stats and taxonomy persisted, visualization attempted.
    Done,
}

/// Summary of one date's batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub date: NaiveDate,
    pub state: BatchState,
    pub reviews: usize,
    pub chunks: usize,
    /// Chunks whose extraction call failed and contributed nothing.
    pub chunks_failed: usize,
    /// Non-empty topics counted into the stats.
    pub extractions: usize,
    pub new_topics: usize,
    pub stats: DailyStats,
    pub stats_path: Option<PathBuf>,
    pub visualization: Option<RenderOutcome>,
}

impl BatchReport {
    pub(crate) fn new(date: NaiveDate) -> Self {
        Self {
            date,
            state: BatchState::NoData,
            reviews: 0,
            chunks: 0,
            chunks_failed: 0,
            extractions: 0,
            new_topics: 0,
            stats: DailyStats::new(),
            stats_path: None,
            visualization: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == BatchState::Done
    }
}
