//! Exit code logic for the autoindex process.
//!
//! Single responsibility: map a download summary to the process exit outcome.

use autoindex_core::DownloadSummary;

use crate::ProcessExit;

/// Determines the process exit outcome from a finished download run.
pub(crate) fn determine_exit_outcome(summary: &DownloadSummary) -> ProcessExit {
    if summary.stopped {
        ProcessExit::Failure
    } else if summary.stats.failed_files == 0 {
        ProcessExit::Success
    } else if summary.stats.completed_files > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use autoindex_core::download::StatsSnapshot;

    use super::*;

    fn summary(completed: usize, failed: usize, stopped: bool) -> DownloadSummary {
        DownloadSummary {
            stats: StatsSnapshot {
                downloaded_bytes: 0,
                total_files: completed + failed,
                completed_files: completed,
                failed_files: failed,
                speed_bytes_per_sec: 0.0,
                elapsed: Duration::ZERO,
            },
            stopped,
        }
    }

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(&summary(3, 0, false)), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_success_when_zero_completed_zero_failed() {
        assert_eq!(determine_exit_outcome(&summary(0, 0, false)), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(&summary(2, 1, false)), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(&summary(0, 2, false)), ProcessExit::Failure);
    }

    #[test]
    fn test_exit_outcome_failure_when_stopped() {
        assert_eq!(determine_exit_outcome(&summary(2, 0, true)), ProcessExit::Failure);
    }
}
