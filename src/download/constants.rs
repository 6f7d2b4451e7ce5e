//! Constants for the download module (timeouts, chunking, units).

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default idle read timeout while streaming a body (30 seconds).
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Default total timeout for fetching one listing page (10 seconds).
pub const PAGE_TIMEOUT_SECS: u64 = 10;

/// Size of one streamed chunk, used for disk writes and progress granularity.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Bytes per mebibyte, for `downloaded_mb` reporting.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
