//! Synchronous failures of [`RecursiveScanner::start`](super::RecursiveScanner::start).

use thiserror::Error;

/// Errors returned before a scan starts.
///
/// Failures during traversal never surface here; they become
/// [`ScanEvent::Error`](super::ScanEvent::Error) events.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    /// A scan is already running or paused on this scanner.
    #[error("a scan is already in progress")]
    AlreadyRunning,

    /// The root URL is malformed or not HTTP(S).
    #[error("invalid root URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ScanError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_url_display_names_url_and_reason() {
        let msg = ScanError::invalid_url("ftp://h/", "unsupported scheme ftp").to_string();
        assert!(msg.contains("ftp://h/"), "Expected URL in: {msg}");
        assert!(msg.contains("unsupported scheme"), "Expected reason in: {msg}");
    }
}
