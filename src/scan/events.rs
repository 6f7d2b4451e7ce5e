//! Events emitted by the scanner.

use std::sync::Arc;

use url::Url;

use crate::inventory::FileEntry;
use crate::parser::LinkRef;

/// Progress notifications from a scan, in the order they happened.
///
/// Consumers receive these asynchronously from the traversal task and from
/// whichever thread called `pause`/`resume`/`cancel`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// About to fetch the listing at `path` (empty path = scan root).
    Scanning {
        path: String,
        depth: usize,
    },
    /// A folder was listed; carries what was found there.
    FolderUpdate {
        path: String,
        folders: Vec<LinkRef>,
        files: Vec<Arc<FileEntry>>,
    },
    /// A folder listing could not be fetched. The rest of the scan goes on.
    Error {
        path: String,
        url: Url,
        message: String,
    },
    Paused,
    Resumed,
    /// Terminal: the scan was cancelled.
    Cancelled,
    /// Terminal: the whole tree (up to the depth limit) was visited.
    Completed {
        total_files: usize,
        total_folders: usize,
    },
    /// Terminal: the root listing itself could not be fetched.
    Failed {
        message: String,
    },
}

impl ScanEvent {
    /// True for the events that end a scan.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Completed { .. } | Self::Failed { .. }
        )
    }
}

/// Human-readable folder path: `"root"` for the scan root.
#[must_use]
pub fn display_path(path: &str) -> &str {
    if path.is_empty() { "root" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_path_root() {
        assert_eq!(display_path(""), "root");
        assert_eq!(display_path("mods/hair"), "mods/hair");
    }

    #[test]
    fn test_terminal_events() {
        assert!(ScanEvent::Cancelled.is_terminal());
        assert!(
            ScanEvent::Completed {
                total_files: 0,
                total_folders: 1
            }
            .is_terminal()
        );
        assert!(!ScanEvent::Paused.is_terminal());
        assert!(
            !ScanEvent::Scanning {
                path: String::new(),
                depth: 0
            }
            .is_terminal()
        );
    }
}
