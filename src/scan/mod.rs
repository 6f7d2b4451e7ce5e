//! Recursive crawler for HTTP directory-listing trees.
//!
//! [`RecursiveScanner`] walks a listing tree depth-first, one request at a
//! time, and builds an inventory of downloadable files plus a per-folder map.
//! Progress is reported as [`ScanEvent`]s over a channel; the scan can be
//! paused, resumed and cancelled from any thread while it runs.
//!
//! # Example
//!
//! ```no_run
//! use autoindex_core::download::HttpClient;
//! use autoindex_core::scan::{RecursiveScanner, ScanEvent, ScanOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (scanner, mut events) = RecursiveScanner::new(HttpClient::new(), ScanOptions::default());
//! let handle = scanner.start("http://mirror.example/pub/")?;
//!
//! while let Some(event) = events.recv().await {
//!     if let ScanEvent::Completed { total_files, .. } = event {
//!         println!("found {total_files} files");
//!         break;
//!     }
//! }
//! handle.await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod events;
mod scanner;
mod state;

pub use error::ScanError;
pub use events::{ScanEvent, display_path};
pub use scanner::{DEFAULT_MAX_DEPTH, RecursiveScanner, ScanOptions, ScanResults};
pub use state::ScanState;
