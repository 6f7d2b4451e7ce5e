//! Autoindex Core Library
//!
//! This library crawls HTTP directory-listing pages (the autoindex pages that
//! Apache, Nginx and most static file servers generate) and downloads the
//! files it finds.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - Listing-page link extraction and extension filtering
//! - [`inventory`] - File and folder records produced by a scan
//! - [`scan`] - Recursive scanner with pause/resume/cancel
//! - [`download`] - HTTP client and concurrent download coordinator
//! - [`format`] - Display helpers for speeds, sizes and names

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod format;
pub mod inventory;
pub mod parser;
pub mod scan;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{
    ClientTimeouts, CoordinatorOptions, DEFAULT_CONCURRENCY, DownloadCoordinator, DownloadEvent,
    DownloadSummary, HttpClient,
};
pub use inventory::{FileEntry, FolderNode};
pub use parser::{ExtensionFilter, LinkRef, parse_listing};
pub use scan::{RecursiveScanner, ScanEvent, ScanOptions, ScanResults, ScanState};
