//! Concurrent download coordinator.
//!
//! [`DownloadCoordinator`] streams a batch of [`FileEntry`]s to disk with a
//! bounded number of concurrent transfers, aggregating bytes, speed and file
//! counts into one [`StatsSnapshot`] that rides along every progress event.
//!
//! # Concurrency Model
//!
//! - Each download runs in its own Tokio task
//! - A semaphore permit is acquired before a job is spawned
//! - Permits are released when the job's task ends (RAII)
//! - Counters live behind one mutex; events carrying them are sent while it
//!   is held, so consumers never see a counter go backwards
//!
//! # Stopping
//!
//! [`DownloadCoordinator::stop`] is cooperative. Jobs not yet started never
//! start; running jobs finish the chunk they are writing and leave the
//! truncated file on disk.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use autoindex_core::download::{CoordinatorOptions, DownloadCoordinator, DownloadEvent, HttpClient};
//!
//! # async fn example(files: Vec<std::sync::Arc<autoindex_core::FileEntry>>) -> Result<(), Box<dyn std::error::Error>> {
//! let (coordinator, mut events) =
//!     DownloadCoordinator::new(HttpClient::new(), CoordinatorOptions::default())?;
//! let run = coordinator.start(files, Path::new("./downloaded_files"))?;
//! while let Some(event) = events.recv().await {
//!     if let DownloadEvent::Completed(summary) = event {
//!         println!("{} of {} files", summary.stats.completed_files, summary.stats.total_files);
//!         break;
//!     }
//! }
//! run.await?;
//! # Ok(())
//! # }
//! ```

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::fs::{self, File};
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::client::{HttpClient, StreamOutcome};
use super::error::DownloadError;
use super::events::{DownloadEvent, DownloadSummary};
use super::stats::{DownloadStats, StatsSnapshot};
use crate::inventory::FileEntry;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 16;

/// Default pool width.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// `start` was called while a run was still active.
    #[error("a download run is already active")]
    AlreadyActive,
}

/// Why a single job failed. Reported as [`DownloadEvent::FileError`].
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The destination directory could not be created.
    #[error("cannot create directory {}: {source}", path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The destination file could not be created.
    #[error("cannot create file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transfer itself failed.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Coordinator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Maximum simultaneous transfers (1-16).
    pub concurrency: usize,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// One file of a run and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub entry: Arc<FileEntry>,
    pub local_path: PathBuf,
}

impl DownloadJob {
    /// Places `entry` at `dest_root/<folder_path>/<name>`.
    #[must_use]
    pub fn new(entry: Arc<FileEntry>, dest_root: &Path) -> Self {
        let local_path = entry.local_path(dest_root);
        Self { entry, local_path }
    }
}

/// Per-job byte count used to derive the file's own progress fraction.
#[derive(Debug, Default)]
struct JobProgress {
    last_reported_bytes: u64,
}

impl JobProgress {
    fn advance(&mut self, chunk: u64, total: u64) -> Option<f64> {
        self.last_reported_bytes = self.last_reported_bytes.saturating_add(chunk);
        if total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.last_reported_bytes as f64 / total as f64;
        Some(fraction.min(1.0))
    }
}

/// Streams batches of files to disk through a bounded worker pool.
///
/// Cheap to clone; clones control the same coordinator. One run at a time.
#[derive(Debug, Clone)]
pub struct DownloadCoordinator {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    client: HttpClient,
    concurrency: usize,
    /// Written only while holding `stats`.
    active: AtomicBool,
    stop: watch::Sender<bool>,
    stats: Mutex<DownloadStats>,
    events: mpsc::UnboundedSender<DownloadEvent>,
}

impl DownloadCoordinator {
    /// Creates an idle coordinator and the receiving end of its event stream.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidConcurrency`] if the pool width is
    /// outside 1-16.
    #[instrument(level = "debug", skip(client))]
    pub fn new(
        client: HttpClient,
        options: CoordinatorOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<DownloadEvent>), CoordinatorError> {
        let concurrency = options.concurrency;
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(CoordinatorError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, "creating download coordinator");

        let (events, receiver) = mpsc::unbounded_channel();
        let (stop, _) = watch::channel(false);
        let coordinator = Self {
            shared: Arc::new(Shared {
                client,
                concurrency,
                active: AtomicBool::new(false),
                stop,
                stats: Mutex::new(DownloadStats::new(0)),
                events,
            }),
        };
        Ok((coordinator, receiver))
    }

    /// Starts downloading `files` into `dest_root` on the Tokio runtime.
    ///
    /// Resets the statistics and returns immediately. The handle resolves to
    /// the same summary carried by the run's [`DownloadEvent::Completed`].
    /// Individual file failures never fail the run.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::AlreadyActive`] if a run is in progress.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[instrument(skip(self, files), fields(files = files.len(), dest_root = %dest_root.display()))]
    pub fn start(
        &self,
        files: Vec<Arc<FileEntry>>,
        dest_root: &Path,
    ) -> Result<JoinHandle<DownloadSummary>, CoordinatorError> {
        let jobs: Vec<DownloadJob> = files
            .into_iter()
            .map(|entry| DownloadJob::new(entry, dest_root))
            .collect();

        {
            let mut stats = self.shared.lock_stats();
            if self.shared.active.swap(true, Ordering::SeqCst) {
                debug!("rejecting start: download run already active");
                return Err(CoordinatorError::AlreadyActive);
            }
            *stats = DownloadStats::new(jobs.len());
            self.shared.stop.send_replace(false);
        }

        info!(
            total = jobs.len(),
            concurrency = self.shared.concurrency,
            "download run started"
        );

        let shared = Arc::clone(&self.shared);
        Ok(tokio::spawn(shared.run(jobs)))
    }

    /// Asks the active run to stop.
    ///
    /// Returns false if no run is active or a stop was already requested.
    pub fn stop(&self) -> bool {
        let _stats = self.shared.lock_stats();
        if !self.shared.active.load(Ordering::SeqCst) {
            return false;
        }
        let requested = self
            .shared
            .stop
            .send_if_modified(|stop| !std::mem::replace(stop, true));
        if requested {
            info!("download run stopping");
        }
        requested
    }

    /// Whether a run is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Counters of the current (or last) run.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.lock_stats().snapshot()
    }

    /// Configured pool width.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.shared.concurrency
    }
}

impl Shared {
    fn lock_stats(&self) -> MutexGuard<'_, DownloadStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, event: DownloadEvent) {
        if self.events.send(event).is_err() {
            debug!("download event dropped: receiver closed");
        }
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    async fn run(self: Arc<Self>, jobs: Vec<DownloadJob>) -> DownloadSummary {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut stop = self.stop.subscribe();
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let permit = tokio::select! {
                biased;
                _ = stop.wait_for(|stop| *stop) => {
                    debug!("stop requested, not starting remaining jobs");
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!("semaphore closed unexpectedly");
                        break;
                    }
                },
            };

            let shared = Arc::clone(&self);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                shared.process_job(job).await;
            }));
        }

        debug!(
            task_count = handles.len(),
            "waiting for downloads to complete"
        );

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "download task panicked");
            }
        }

        let summary = {
            let stats = self.lock_stats();
            let summary = DownloadSummary {
                stats: stats.snapshot(),
                stopped: self.stop_requested(),
            };
            self.active.store(false, Ordering::SeqCst);
            self.send(DownloadEvent::Completed(summary));
            summary
        };

        info!(
            completed = summary.stats.completed_files,
            failed = summary.stats.failed_files,
            total = summary.stats.total_files,
            bytes = summary.stats.downloaded_bytes,
            stopped = summary.stopped,
            "download run finished"
        );
        summary
    }

    #[instrument(skip(self, job), fields(url = %job.entry.url))]
    async fn process_job(&self, job: DownloadJob) {
        if self.stop_requested() {
            debug!("skipping job: stop requested");
            return;
        }

        let name = job.entry.name.clone();
        self.send(DownloadEvent::FileStarted {
            name: name.clone(),
            url: job.entry.url.clone(),
        });

        match self.download(&job).await {
            Ok(StreamOutcome::Completed { bytes_written, .. }) => {
                {
                    let mut stats = self.lock_stats();
                    stats.record_completed();
                    self.send(DownloadEvent::OverallProgress {
                        name,
                        stats: stats.snapshot(),
                    });
                }
                info!(path = %job.local_path.display(), bytes_written, "download completed");
            }
            Ok(StreamOutcome::Stopped { bytes_written }) => {
                debug!(
                    path = %job.local_path.display(),
                    bytes_written,
                    "download stopped, partial file left on disk"
                );
            }
            Err(error) => {
                warn!(path = %job.local_path.display(), error = %error, "download failed");
                let mut stats = self.lock_stats();
                stats.record_failed();
                self.send(DownloadEvent::FileError {
                    name,
                    url: job.entry.url.clone(),
                    message: error.to_string(),
                });
            }
        }
    }

    async fn download(&self, job: &DownloadJob) -> Result<StreamOutcome, JobError> {
        if let Some(parent) = job.local_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| JobError::Path {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut file = File::create(&job.local_path)
            .await
            .map_err(|source| JobError::Create {
                path: job.local_path.clone(),
                source,
            })?;

        let mut progress = JobProgress::default();
        let outcome = self
            .client
            .stream_download(job.entry.url.as_str(), &mut file, |chunk, total| {
                let file_progress = progress.advance(chunk, total);
                {
                    let mut stats = self.lock_stats();
                    stats.record_bytes(chunk);
                    self.send(DownloadEvent::FileProgress {
                        name: job.entry.name.clone(),
                        file_progress,
                        stats: stats.snapshot(),
                    });
                }
                if self.stop_requested() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await?;

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;

    fn entry(folder_path: &str, name: &str) -> Arc<FileEntry> {
        Arc::new(FileEntry {
            name: name.to_string(),
            url: Url::parse(&format!("http://127.0.0.1:9/{name}")).unwrap(),
            folder_path: folder_path.to_string(),
            size_hint: None,
        })
    }

    #[test]
    fn test_new_rejects_invalid_concurrency() {
        for value in [0, 17] {
            let result =
                DownloadCoordinator::new(HttpClient::new(), CoordinatorOptions { concurrency: value });
            assert!(matches!(
                result,
                Err(CoordinatorError::InvalidConcurrency { value: v }) if v == value
            ));
        }
    }

    #[test]
    fn test_default_concurrency_is_three() {
        let (coordinator, _events) =
            DownloadCoordinator::new(HttpClient::new(), CoordinatorOptions::default()).unwrap();
        assert_eq!(coordinator.concurrency(), 3);
        assert!(!coordinator.is_active());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let (coordinator, _events) =
            DownloadCoordinator::new(HttpClient::new(), CoordinatorOptions::default()).unwrap();
        assert!(!coordinator.stop());
    }

    #[test]
    fn test_job_local_path_under_dest_root() {
        let job = DownloadJob::new(entry("mods/textures", "pack.zip"), Path::new("/tmp/out"));
        assert_eq!(
            job.local_path,
            PathBuf::from("/tmp/out/mods/textures/pack.zip")
        );
    }

    #[test]
    fn test_job_progress_fraction() {
        let mut progress = JobProgress::default();
        assert_eq!(progress.advance(100, 0), None);

        let mut progress = JobProgress::default();
        assert_eq!(progress.advance(50, 200), Some(0.25));
        assert_eq!(progress.advance(150, 200), Some(1.0));
        // Body longer than its Content-Length still caps at 1.0.
        assert_eq!(progress.advance(10, 200), Some(1.0));
    }

    #[test]
    fn test_job_error_display() {
        let error = JobError::Path {
            path: PathBuf::from("/out/sub"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = error.to_string();
        assert!(msg.contains("/out/sub"), "Expected path in: {msg}");
        assert!(msg.contains("denied"), "Expected cause in: {msg}");
    }

    #[tokio::test]
    async fn test_empty_run_completes_immediately() {
        let (coordinator, mut events) =
            DownloadCoordinator::new(HttpClient::new(), CoordinatorOptions::default()).unwrap();
        let dest = tempfile::tempdir().unwrap();

        let summary = coordinator.start(Vec::new(), dest.path()).unwrap().await.unwrap();

        assert_eq!(summary.stats.total_files, 0);
        assert!(!summary.stopped);
        assert!(summary.is_complete());
        assert!(!coordinator.is_active());
        assert_eq!(events.recv().await, Some(DownloadEvent::Completed(summary)));
    }

    #[tokio::test]
    async fn test_directory_failure_is_isolated_to_its_job() {
        let (coordinator, mut events) =
            DownloadCoordinator::new(HttpClient::new(), CoordinatorOptions::default()).unwrap();
        // A regular file where the destination root should be: every
        // create_dir_all under it fails.
        let blocker = tempfile::NamedTempFile::new().unwrap();

        let summary = coordinator
            .start(vec![entry("sub", "a.zip")], blocker.path())
            .unwrap()
            .await
            .unwrap();

        assert_eq!(summary.stats.failed_files, 1);
        assert_eq!(summary.stats.completed_files, 0);

        let mut saw_error = false;
        while let Ok(event) = events.try_recv() {
            if let DownloadEvent::FileError { name, message, .. } = event {
                assert_eq!(name, "a.zip");
                assert!(message.contains("cannot create directory"), "got: {message}");
                saw_error = true;
            }
        }
        assert!(saw_error);
    }
}
