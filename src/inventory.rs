//! Inventory data model shared by the scanner and the download coordinator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::parser::LinkRef;

/// A downloadable file discovered during a scan.
///
/// Entries are immutable once created. The scanner hands them out as
/// `Arc<FileEntry>` so the inventory, folder map and an active download run
/// all share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// File name as shown on the listing page (percent-decoded).
    pub name: String,
    /// Absolute download URL.
    pub url: Url,
    /// Slash-separated path of the containing folder, empty for the scan root.
    pub folder_path: String,
    /// Size in bytes when known (from a HEAD probe).
    pub size_hint: Option<u64>,
}

impl FileEntry {
    /// Builds an entry from a parsed file link found under `folder_path`.
    #[must_use]
    pub fn from_link(link: LinkRef, folder_path: &str) -> Self {
        Self {
            name: link.name,
            url: link.url,
            folder_path: folder_path.to_string(),
            size_hint: None,
        }
    }

    /// Path relative to the scan root, e.g. `mods/textures/pack.zip`.
    #[must_use]
    pub fn relative_path(&self) -> String {
        join_folder_path(&self.folder_path, &self.name)
    }

    /// Local destination for this entry under `dest_root`.
    ///
    /// Each folder segment and the file name go through
    /// [`sanitize_component`], so a hostile listing cannot escape `dest_root`.
    #[must_use]
    pub fn local_path(&self, dest_root: &Path) -> PathBuf {
        let mut path = dest_root.to_path_buf();
        for segment in self.folder_path.split('/').filter(|s| !s.is_empty()) {
            path.push(sanitize_component(segment));
        }
        path.push(sanitize_component(&self.name));
        path
    }
}

/// One visited directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    /// Folder path (the key in the folder map).
    pub path: String,
    /// Sub-folders in document order.
    pub child_folders: Vec<LinkRef>,
    /// Files that passed the extension filter, in document order.
    pub files: Vec<Arc<FileEntry>>,
}

/// Joins a folder path and a child name with `/`.
///
/// ```
/// use autoindex_core::inventory::join_folder_path;
///
/// assert_eq!(join_folder_path("", "iso"), "iso");
/// assert_eq!(join_folder_path("pub/linux", "iso"), "pub/linux/iso");
/// ```
#[must_use]
pub fn join_folder_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Replaces characters that are invalid in file names on common platforms.
///
/// `.` and `..` become `_` so a segment can never walk up the tree.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    let cleaned: String = name
        .chars()
        .map(|c| if INVALID.contains(&c) || c.is_control() { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
