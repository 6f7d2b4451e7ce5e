//! Scan-then-download pipeline for one invocation.

use std::io::{self, IsTerminal};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use autoindex_core::format::{format_size, format_speed};
use autoindex_core::{
    CoordinatorOptions, DownloadCoordinator, DownloadEvent, ExtensionFilter, FileEntry,
    HttpClient, RecursiveScanner, ScanOptions, ScanState,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::exit_handler::determine_exit_outcome;
use crate::app::inventory_output::{render_json, render_listing};
use crate::app::progress::{DownloadProgress, ScanProgress};
use crate::app::settings::{OutputMode, RunSettings};
use crate::app::terminal;

pub(crate) async fn run(settings: RunSettings, quiet: bool) -> Result<ProcessExit> {
    let client =
        HttpClient::try_with_timeouts(settings.timeouts).context("Failed to build HTTP client")?;
    let use_progress =
        terminal::should_use_progress(io::stderr().is_terminal(), quiet, terminal::is_dumb_terminal());

    let Some(files) = scan(&settings, client.clone(), use_progress).await? else {
        return Ok(ProcessExit::Failure);
    };

    let selected: Vec<Arc<FileEntry>> = files
        .into_iter()
        .filter(|entry| settings.selects(&entry.relative_path()))
        .collect();

    match settings.mode {
        OutputMode::List => {
            print!("{}", render_listing(&selected));
            return Ok(ProcessExit::Success);
        }
        OutputMode::Json => {
            println!("{}", render_json(&settings.url, &selected)?);
            return Ok(ProcessExit::Success);
        }
        OutputMode::Download => {}
    }

    if selected.is_empty() {
        info!("No files to download");
        return Ok(ProcessExit::Success);
    }

    download(&settings, client, selected, use_progress).await
}

/// Runs the scan to its end. `None` means the user cancelled it.
async fn scan(
    settings: &RunSettings,
    client: HttpClient,
    use_progress: bool,
) -> Result<Option<Vec<Arc<FileEntry>>>> {
    let options = ScanOptions {
        max_depth: settings.max_depth,
        probe_sizes: settings.probe_sizes,
        extensions: ExtensionFilter::default(),
    };
    let (scanner, mut events) = RecursiveScanner::new(client, options);
    let handle = scanner.start(&settings.url)?;
    info!(url = %settings.url, max_depth = settings.max_depth, "Scanning");

    let mut progress = ScanProgress::new(use_progress);
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                progress.handle(&event);
                if event.is_terminal() {
                    break;
                }
            }
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() && scanner.cancel() {
                    warn!("Interrupted, cancelling scan");
                }
            }
        }
    }

    let final_state = handle.await.context("Scan task failed")?;
    let results = scanner.results();
    match final_state {
        ScanState::Completed => {
            info!(
                files = results.total_files(),
                folders = results.total_folders(),
                "Scan complete"
            );
            Ok(Some(results.files))
        }
        ScanState::Cancelled => {
            warn!(
                files = results.total_files(),
                folders = results.total_folders(),
                "Scan cancelled"
            );
            Ok(None)
        }
        ScanState::Failed => bail!("Could not list {}", settings.url),
        other => bail!("Scan ended in unexpected state {other:?}"),
    }
}

async fn download(
    settings: &RunSettings,
    client: HttpClient,
    files: Vec<Arc<FileEntry>>,
    use_progress: bool,
) -> Result<ProcessExit> {
    let (coordinator, mut events) = DownloadCoordinator::new(
        client,
        CoordinatorOptions {
            concurrency: settings.concurrency,
        },
    )?;

    let total = files.len();
    let handle = coordinator.start(files, &settings.output_dir)?;
    info!(
        files = total,
        output_dir = %settings.output_dir.display(),
        concurrency = settings.concurrency,
        "Downloading"
    );

    let progress = DownloadProgress::new(use_progress, total);
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                progress.handle(&event);
                if matches!(event, DownloadEvent::Completed(_)) {
                    break;
                }
            }
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() && coordinator.stop() {
                    warn!("Interrupted, stopping downloads");
                }
            }
        }
    }

    let summary = handle.await.context("Download task failed")?;
    debug!(?summary, "download summary");
    info!(
        completed = summary.stats.completed_files,
        failed = summary.stats.failed_files,
        total = summary.stats.total_files,
        downloaded = %format_size(summary.stats.downloaded_bytes),
        speed = %format_speed(summary.stats.speed_bytes_per_sec),
        "Download complete"
    );
    if summary.stopped {
        warn!("Stopped before all files finished; partial files were left on disk");
    }

    Ok(determine_exit_outcome(&summary))
}
