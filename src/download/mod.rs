//! HTTP access and the concurrent download coordinator.
//!
//! [`HttpClient`] fetches listing pages whole and streams file bodies in
//! fixed 8 KiB chunks. [`DownloadCoordinator`] drives a bounded pool of those
//! streams to disk and reports progress as [`DownloadEvent`]s.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Configurable timeouts (10s connect, 30s read, 10s per listing page)
//! - Structured error types with full context
//! - Cooperative stop that leaves partial files in place
//!
//! # Example
//!
//! ```no_run
//! use autoindex_core::download::HttpClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let page = client.fetch_text("http://mirror.example.org/pub/").await?;
//! println!("{} bytes of listing", page.len());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod coordinator;
mod error;
mod events;
mod stats;

pub use client::{ClientTimeouts, HttpClient, StreamOutcome};
pub use coordinator::{
    CoordinatorError, CoordinatorOptions, DEFAULT_CONCURRENCY, DownloadCoordinator, DownloadJob,
    JobError,
};
pub use error::{DownloadError, FetchError};
pub use events::{DownloadEvent, DownloadSummary};
pub use stats::StatsSnapshot;

// Note: no module-local Result aliases.
// Use `Result<T, DownloadError>` explicitly in function signatures.
