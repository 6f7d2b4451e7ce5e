//! Byte/file counters for one download run.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::constants::BYTES_PER_MB;

/// Mutable counters for one run of the coordinator.
///
/// Lives behind the coordinator's stats mutex; every mutation happens there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DownloadStats {
    start_time: Instant,
    downloaded_bytes: u64,
    total_files: usize,
    completed_files: usize,
    failed_files: usize,
    current_speed: f64,
}

impl DownloadStats {
    pub(crate) fn new(total_files: usize) -> Self {
        Self {
            start_time: Instant::now(),
            downloaded_bytes: 0,
            total_files,
            completed_files: 0,
            failed_files: 0,
            current_speed: 0.0,
        }
    }

    /// Adds a written chunk and recomputes the average speed.
    pub(crate) fn record_bytes(&mut self, bytes: u64) {
        self.downloaded_bytes = self.downloaded_bytes.saturating_add(bytes);
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            #[allow(clippy::cast_precision_loss)]
            let downloaded = self.downloaded_bytes as f64;
            self.current_speed = downloaded / elapsed;
        }
    }

    pub(crate) fn record_completed(&mut self) {
        if self.completed_files < self.total_files {
            self.completed_files += 1;
        }
    }

    pub(crate) fn record_failed(&mut self) {
        self.failed_files += 1;
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            downloaded_bytes: self.downloaded_bytes,
            total_files: self.total_files,
            completed_files: self.completed_files,
            failed_files: self.failed_files,
            speed_bytes_per_sec: self.current_speed,
            elapsed: self.start_time.elapsed(),
        }
    }
}

/// Read-only copy of the run counters, carried by progress events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Bytes written across all jobs of the run.
    pub downloaded_bytes: u64,
    /// Files requested at `start`.
    pub total_files: usize,
    /// Files fully downloaded.
    pub completed_files: usize,
    /// Files that ended in an error.
    pub failed_files: usize,
    /// `downloaded_bytes / elapsed` at the last chunk.
    pub speed_bytes_per_sec: f64,
    /// Time since `start`.
    pub elapsed: Duration,
}

impl StatsSnapshot {
    /// `completed_files / total_files`, in `0.0..=1.0`. An empty run counts as done.
    #[must_use]
    pub fn overall_progress(&self) -> f64 {
        if self.total_files == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed_files as f64 / self.total_files as f64;
        ratio
    }

    /// Downloaded bytes in MiB.
    #[must_use]
    pub fn downloaded_mb(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let bytes = self.downloaded_bytes as f64;
        bytes / BYTES_PER_MB
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_bytes_accumulates_and_sets_speed() {
        let mut stats = DownloadStats::new(2);
        std::thread::sleep(Duration::from_millis(5));
        stats.record_bytes(1024);
        stats.record_bytes(1024);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.downloaded_bytes, 2048);
        assert!(snapshot.speed_bytes_per_sec > 0.0);
    }

    #[test]
    fn test_completed_never_exceeds_total() {
        let mut stats = DownloadStats::new(1);
        stats.record_completed();
        stats.record_completed();
        assert_eq!(stats.snapshot().completed_files, 1);
    }

    #[test]
    fn test_overall_progress_and_mb() {
        let mut stats = DownloadStats::new(4);
        stats.record_completed();
        stats.record_bytes(3 * 1024 * 1024);
        let snapshot = stats.snapshot();
        assert!((snapshot.overall_progress() - 0.25).abs() < f64::EPSILON);
        assert!((snapshot.downloaded_mb() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_run_progress_is_complete() {
        let stats = DownloadStats::new(0);
        assert!((stats.snapshot().overall_progress() - 1.0).abs() < f64::EPSILON);
    }
}
