//! Depth-first traversal with pause/resume/cancel control.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::ScanError;
use super::events::{ScanEvent, display_path};
use super::state::ScanState;
use crate::download::HttpClient;
use crate::inventory::{FileEntry, FolderNode, join_folder_path};
use crate::parser::{ExtensionFilter, parse_listing};

/// Default depth limit; the root is depth 0.
pub const DEFAULT_MAX_DEPTH: usize = 15;

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Folders deeper than this are not visited.
    pub max_depth: usize,
    /// Send a HEAD request per kept file to fill [`FileEntry::size_hint`].
    pub probe_sizes: bool,
    /// Which linked files make it into the inventory.
    pub extensions: ExtensionFilter,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            probe_sizes: false,
            extensions: ExtensionFilter::default(),
        }
    }
}

/// Snapshot of what a scan has found so far.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResults {
    /// Every kept file in discovery order.
    pub files: Vec<Arc<FileEntry>>,
    /// Visited folders keyed by folder path.
    pub folders: BTreeMap<String, FolderNode>,
}

impl ScanResults {
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn total_folders(&self) -> usize {
        self.folders.len()
    }
}

/// State plus the id of the run that owns it.
///
/// The id lets a traversal that was cancelled and then superseded by a new
/// `start` recognize that it no longer owns the scanner.
#[derive(Debug, Clone, Copy, Default)]
struct Status {
    state: ScanState,
    run: u64,
}

impl Status {
    fn is_live(self, run: u64) -> bool {
        self.run == run && self.state.is_active()
    }
}

/// How one node of the traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeOutcome {
    Listed,
    FetchFailed,
    Skipped,
}

/// Crawls a directory-listing tree.
///
/// Cloning is cheap and yields a handle to the same scanner, so control
/// operations can be issued from a different task than the one that started
/// the scan.
///
/// # Event ordering
///
/// Every state transition and every traversal event is published while
/// holding the status lock, which gives these guarantees:
/// - exactly one terminal event per run
/// - nothing but `Paused`/`Resumed` interleaves with traversal events
/// - no `Scanning` or `FolderUpdate` follows a `Cancelled`
#[derive(Debug, Clone)]
pub struct RecursiveScanner {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    client: HttpClient,
    options: ScanOptions,
    status: watch::Sender<Status>,
    results: Mutex<ScanResults>,
    events: mpsc::UnboundedSender<ScanEvent>,
}

impl RecursiveScanner {
    /// Creates an idle scanner and the receiving end of its event stream.
    ///
    /// The receiver outlives individual runs: events of every subsequent
    /// `start` arrive on it.
    #[must_use]
    pub fn new(
        client: HttpClient,
        options: ScanOptions,
    ) -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(Status::default());
        let scanner = Self {
            shared: Arc::new(Shared {
                client,
                options,
                status,
                results: Mutex::new(ScanResults::default()),
                events,
            }),
        };
        (scanner, receiver)
    }

    /// Starts scanning `root_url` on the Tokio runtime.
    ///
    /// Clears previous results, moves to [`ScanState::Running`] and returns
    /// immediately. The returned handle resolves to this run's final state.
    ///
    /// # Errors
    ///
    /// - [`ScanError::InvalidUrl`] if `root_url` is not an absolute HTTP(S) URL
    /// - [`ScanError::AlreadyRunning`] if a scan is running or paused
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&self, root_url: &str) -> Result<JoinHandle<ScanState>, ScanError> {
        let root = parse_root_url(root_url)?;

        let mut run = 0;
        let started = self.shared.status.send_if_modified(|status| {
            if status.state.is_active() {
                return false;
            }
            status.run += 1;
            status.state = ScanState::Running;
            run = status.run;
            true
        });
        if !started {
            debug!("rejecting start: scan already in progress");
            return Err(ScanError::AlreadyRunning);
        }

        *self.shared.lock_results() = ScanResults::default();
        info!(root = %root, run, max_depth = self.shared.options.max_depth, "scan started");

        let shared = Arc::clone(&self.shared);
        Ok(tokio::spawn(async move { shared.run(root, run).await }))
    }

    /// Pauses a running scan before its next request.
    ///
    /// An in-flight listing request still completes. Returns false (and does
    /// nothing) unless the scan was running.
    pub fn pause(&self) -> bool {
        self.shared
            .transition(ScanState::Running, ScanState::Paused, ScanEvent::Paused)
    }

    /// Resumes a paused scan. Returns false unless the scan was paused.
    pub fn resume(&self) -> bool {
        self.shared
            .transition(ScanState::Paused, ScanState::Running, ScanEvent::Resumed)
    }

    /// Cancels a running or paused scan.
    ///
    /// Emits the single `Cancelled` event; the traversal unwinds at its next
    /// check point without visiting further folders. Calling it again, or on
    /// a scan that is not active, is a no-op returning false.
    pub fn cancel(&self) -> bool {
        let cancelled = self.shared.status.send_if_modified(|status| {
            if !status.state.is_active() {
                return false;
            }
            status.state = ScanState::Cancelled;
            self.shared.send(ScanEvent::Cancelled);
            true
        });
        if cancelled {
            info!("scan cancelled");
        }
        cancelled
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.shared.status.borrow().state
    }

    /// Point-in-time copy of the inventory and folder map.
    ///
    /// Safe to call while a scan is running; reflects partial results.
    #[must_use]
    pub fn results(&self) -> ScanResults {
        self.shared.lock_results().clone()
    }

    /// The scanner's configuration.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.shared.options
    }
}

impl Shared {
    fn lock_results(&self) -> std::sync::MutexGuard<'_, ScanResults> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, event: ScanEvent) {
        if self.events.send(event).is_err() {
            debug!("scan event dropped: receiver closed");
        }
    }

    fn transition(&self, from: ScanState, to: ScanState, event: ScanEvent) -> bool {
        let mut event = Some(event);
        let changed = self.status.send_if_modified(|status| {
            if status.state != from {
                return false;
            }
            status.state = to;
            if let Some(event) = event.take() {
                self.send(event);
            }
            true
        });
        if changed {
            info!(?from, ?to, "scan state changed");
        }
        changed
    }

    /// Publishes a traversal event only while `run` still owns a live scan.
    fn emit_if_live(&self, run: u64, event: ScanEvent) -> bool {
        let mut event = Some(event);
        let mut emitted = false;
        self.status.send_if_modified(|status| {
            if status.is_live(run)
                && let Some(event) = event.take()
            {
                self.send(event);
                emitted = true;
            }
            false
        });
        emitted
    }

    /// Waits out any pause, then publishes `event` only if `run` is running.
    ///
    /// A pause landing between the wait and the publish sends it back to
    /// waiting, so nothing is emitted or requested while paused. Returns
    /// false once the run is no longer live.
    async fn emit_when_running(&self, run: u64, event: ScanEvent) -> bool {
        let mut event = Some(event);
        loop {
            if !self.wait_while_paused(run).await {
                return false;
            }
            let mut outcome = None;
            self.status.send_if_modified(|status| {
                if status.run == run && status.state == ScanState::Running {
                    if let Some(event) = event.take() {
                        self.send(event);
                    }
                    outcome = Some(true);
                } else if !status.is_live(run) {
                    outcome = Some(false);
                }
                false
            });
            if let Some(emitted) = outcome {
                return emitted;
            }
        }
    }

    fn is_live(&self, run: u64) -> bool {
        self.status.borrow().is_live(run)
    }

    /// Blocks while paused. Returns whether the run may continue.
    async fn wait_while_paused(&self, run: u64) -> bool {
        let mut receiver = self.status.subscribe();
        let status = match receiver
            .wait_for(|status| status.run != run || status.state != ScanState::Paused)
            .await
        {
            Ok(status) => *status,
            Err(_) => return false,
        };
        status.is_live(run)
    }

    async fn run(self: Arc<Self>, root: Url, run: u64) -> ScanState {
        let outcome = self.scan_node(root, String::new(), 0, run).await;

        // Lock order is results before status.
        let (total_files, total_folders) = {
            let results = self.lock_results();
            (results.total_files(), results.total_folders())
        };

        let mut final_state = ScanState::Cancelled;
        self.status.send_if_modified(|status| {
            if !status.is_live(run) {
                return false;
            }
            if outcome == NodeOutcome::FetchFailed {
                status.state = ScanState::Failed;
                self.send(ScanEvent::Failed {
                    message: "root listing could not be fetched".to_string(),
                });
            } else {
                status.state = ScanState::Completed;
                self.send(ScanEvent::Completed {
                    total_files,
                    total_folders,
                });
            }
            final_state = status.state;
            true
        });

        info!(
            run,
            state = ?final_state,
            files = total_files,
            folders = total_folders,
            "scan finished"
        );
        final_state
    }

    fn scan_node(&self, url: Url, path: String, depth: usize, run: u64) -> BoxFuture<'_, NodeOutcome> {
        async move {
            if depth > self.options.max_depth || !self.is_live(run) {
                return NodeOutcome::Skipped;
            }
            if !self
                .emit_when_running(
                    run,
                    ScanEvent::Scanning {
                        path: path.clone(),
                        depth,
                    },
                )
                .await
            {
                return NodeOutcome::Skipped;
            }
            debug!(path = display_path(&path), depth, url = %url, "scanning folder");

            let html = match self.client.fetch_text(url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(path = display_path(&path), url = %url, error = %e, "folder listing failed");
                    self.emit_if_live(
                        run,
                        ScanEvent::Error {
                            path,
                            url,
                            message: e.to_string(),
                        },
                    );
                    return NodeOutcome::FetchFailed;
                }
            };

            let links = parse_listing(&html, &url);
            let mut files = Vec::new();
            for link in links.files {
                if !self.options.extensions.allows(&link.name) {
                    continue;
                }
                let mut entry = FileEntry::from_link(link, &path);
                if self.options.probe_sizes {
                    // No probe is sent while paused or after cancel.
                    if !self.wait_while_paused(run).await {
                        debug!(path = display_path(&path), "size probes abandoned");
                        return NodeOutcome::Skipped;
                    }
                    entry.size_hint = self.client.content_length(entry.url.as_str()).await;
                }
                files.push(Arc::new(entry));
            }

            {
                let mut results = self.lock_results();
                if !self.is_live(run) {
                    debug!(path = display_path(&path), "discarding listing of cancelled scan");
                    return NodeOutcome::Skipped;
                }
                results.files.extend(files.iter().cloned());
                results.folders.insert(
                    path.clone(),
                    FolderNode {
                        path: path.clone(),
                        child_folders: links.folders.clone(),
                        files: files.clone(),
                    },
                );
            }

            self.emit_if_live(
                run,
                ScanEvent::FolderUpdate {
                    path: path.clone(),
                    folders: links.folders.clone(),
                    files,
                },
            );

            for folder in links.folders {
                if !self.is_live(run) {
                    break;
                }
                let child_path = join_folder_path(&path, &folder.name);
                self.scan_node(folder.url, child_path, depth + 1, run).await;
            }

            NodeOutcome::Listed
        }
        .boxed()
    }
}

fn parse_root_url(root_url: &str) -> Result<Url, ScanError> {
    let trimmed = root_url.trim();
    let url = Url::parse(trimmed).map_err(|e| ScanError::invalid_url(trimmed, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ScanError::invalid_url(
            trimmed,
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scanner() -> (RecursiveScanner, mpsc::UnboundedReceiver<ScanEvent>) {
        RecursiveScanner::new(HttpClient::new(), ScanOptions::default())
    }

    #[test]
    fn test_new_scanner_is_idle_and_empty() {
        let (scanner, _events) = scanner();
        assert_eq!(scanner.state(), ScanState::Idle);
        assert_eq!(scanner.results().total_files(), 0);
        assert_eq!(scanner.results().total_folders(), 0);
    }

    #[test]
    fn test_start_rejects_malformed_url_synchronously() {
        let (scanner, _events) = scanner();
        let result = scanner.start("not a url");
        assert!(matches!(result, Err(ScanError::InvalidUrl { .. })));
        assert_eq!(scanner.state(), ScanState::Idle);
    }

    #[test]
    fn test_start_rejects_non_http_scheme() {
        let (scanner, _events) = scanner();
        match scanner.start("ftp://mirror.example/pub/") {
            Err(ScanError::InvalidUrl { reason, .. }) => assert!(reason.contains("ftp")),
            other => panic!("Expected InvalidUrl, got: {other:?}"),
        }
    }

    #[test]
    fn test_control_operations_are_noops_when_idle() {
        let (scanner, mut events) = scanner();
        assert!(!scanner.pause());
        assert!(!scanner.resume());
        assert!(!scanner.cancel());
        assert_eq!(scanner.state(), ScanState::Idle);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_while_running_fails_fast() {
        let (scanner, _events) = scanner();
        // Unroutable port: the traversal sits in its first request or fails fast.
        let handle = scanner.start("http://127.0.0.1:9/").unwrap();
        if scanner.state().is_active() {
            assert_eq!(
                scanner.start("http://127.0.0.1:9/").unwrap_err(),
                ScanError::AlreadyRunning
            );
        }
        scanner.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_resume_cancel_transitions() {
        let (scanner, mut events) = scanner();
        scanner
            .shared
            .status
            .send_modify(|status| status.state = ScanState::Running);

        assert!(scanner.pause());
        assert!(!scanner.pause());
        assert_eq!(scanner.state(), ScanState::Paused);
        assert!(scanner.resume());
        assert!(!scanner.resume());
        assert!(scanner.cancel());
        assert!(!scanner.cancel());
        assert_eq!(scanner.state(), ScanState::Cancelled);

        assert_eq!(events.recv().await.unwrap(), ScanEvent::Paused);
        assert_eq!(events.recv().await.unwrap(), ScanEvent::Resumed);
        assert_eq!(events.recv().await.unwrap(), ScanEvent::Cancelled);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_scanning_event_waits_for_running_state() {
        let (scanner, mut events) = scanner();
        scanner.shared.status.send_modify(|status| {
            status.run = 1;
            status.state = ScanState::Paused;
        });

        let shared = Arc::clone(&scanner.shared);
        let emit = tokio::spawn(async move {
            shared
                .emit_when_running(
                    1,
                    ScanEvent::Scanning {
                        path: String::new(),
                        depth: 0,
                    },
                )
                .await
        });
        tokio::task::yield_now().await;
        assert!(!emit.is_finished());
        assert!(events.try_recv().is_err(), "nothing is emitted while paused");

        assert!(scanner.resume());
        assert!(emit.await.unwrap());
        assert_eq!(events.recv().await.unwrap(), ScanEvent::Resumed);
        assert!(matches!(
            events.recv().await.unwrap(),
            ScanEvent::Scanning { depth: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_scanning_event_dropped_after_cancel_while_paused() {
        let (scanner, mut events) = scanner();
        scanner.shared.status.send_modify(|status| {
            status.run = 1;
            status.state = ScanState::Paused;
        });

        let shared = Arc::clone(&scanner.shared);
        let emit = tokio::spawn(async move {
            shared
                .emit_when_running(
                    1,
                    ScanEvent::Scanning {
                        path: String::new(),
                        depth: 0,
                    },
                )
                .await
        });
        tokio::task::yield_now().await;

        assert!(scanner.cancel());
        assert!(!emit.await.unwrap());
        assert_eq!(events.recv().await.unwrap(), ScanEvent::Cancelled);
        assert!(events.try_recv().is_err());
    }
}
