//! Events emitted by the download coordinator.

use url::Url;

use super::stats::StatsSnapshot;

/// Notifications from a download run.
///
/// Events carrying a [`StatsSnapshot`] are sent under the stats lock, so
/// across the stream `downloaded_bytes` and `completed_files` never decrease.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// A job got a pool slot and is about to request its file.
    FileStarted {
        name: String,
        url: Url,
    },
    /// A chunk of `name` was written.
    FileProgress {
        name: String,
        /// Fraction of this file written, `None` when the size is unknown.
        file_progress: Option<f64>,
        stats: StatsSnapshot,
    },
    /// `name` finished; `stats.completed_files` includes it.
    OverallProgress {
        name: String,
        stats: StatsSnapshot,
    },
    /// `name` failed. Other jobs are unaffected.
    FileError {
        name: String,
        url: Url,
        message: String,
    },
    /// Sent exactly once per run, after every job has ended.
    Completed(DownloadSummary),
}

/// Final tally of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadSummary {
    pub stats: StatsSnapshot,
    /// The run was stopped before all jobs ran to completion.
    pub stopped: bool,
}

impl DownloadSummary {
    /// Every requested file was downloaded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.stopped && self.stats.completed_files == self.stats.total_files
    }
}
