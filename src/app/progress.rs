//! Progress UI (spinner and bar) driven by scan and download events.

use std::time::Duration;

use autoindex_core::format::{format_speed, truncate_name};
use autoindex_core::scan::display_path;
use autoindex_core::{DownloadEvent, ScanEvent};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

/// Longest file name shown next to the download bar.
const NAME_WIDTH: usize = 32;

/// Spinner shown while the scanner walks the tree.
pub(crate) struct ScanProgress {
    spinner: ProgressBar,
    folders: usize,
    files: usize,
}

impl ScanProgress {
    /// A hidden spinner still counts, it just never draws.
    pub(crate) fn new(enabled: bool) -> Self {
        let spinner = if enabled {
            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        } else {
            ProgressBar::hidden()
        };
        Self {
            spinner,
            folders: 0,
            files: 0,
        }
    }

    pub(crate) fn handle(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::Scanning { path, depth } => {
                self.spinner.set_message(format!(
                    "[{} folders, {} files] Scanning {} (depth {depth})",
                    self.folders,
                    self.files,
                    display_path(path)
                ));
            }
            ScanEvent::FolderUpdate { files, .. } => {
                self.folders += 1;
                self.files += files.len();
            }
            ScanEvent::Error { path, url, message } => {
                self.spinner.suspend(|| {
                    warn!(folder = display_path(path), url = %url, error = %message, "Could not list folder");
                });
            }
            ScanEvent::Paused => self.spinner.set_message("Paused"),
            ScanEvent::Resumed => debug!("scan resumed"),
            ScanEvent::Cancelled | ScanEvent::Completed { .. } | ScanEvent::Failed { .. } => {
                self.spinner.finish_and_clear();
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn folders(&self) -> usize {
        self.folders
    }

    #[cfg(test)]
    pub(crate) fn files(&self) -> usize {
        self.files
    }
}

/// Overall bar shown while files download.
pub(crate) struct DownloadProgress {
    bar: ProgressBar,
}

impl DownloadProgress {
    pub(crate) fn new(enabled: bool, total_files: usize) -> Self {
        let bar = if enabled {
            let bar = ProgressBar::new(total_files as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:30} {pos}/{len} files {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub(crate) fn handle(&self, event: &DownloadEvent) {
        match event {
            DownloadEvent::FileStarted { name, .. } => debug!(file = %name, "download started"),
            DownloadEvent::FileProgress { name, stats, .. } => {
                self.bar.set_message(format!(
                    "| {} | {} | {:.1} MB",
                    truncate_name(name, NAME_WIDTH),
                    format_speed(stats.speed_bytes_per_sec),
                    stats.downloaded_mb()
                ));
            }
            DownloadEvent::OverallProgress { stats, .. } => {
                self.bar.set_position(stats.completed_files as u64);
            }
            DownloadEvent::FileError { name, url, message } => {
                self.bar.suspend(|| {
                    warn!(file = %name, url = %url, error = %message, "Download failed");
                });
            }
            DownloadEvent::Completed(_) => self.bar.finish_and_clear(),
        }
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.bar.position()
    }
}
