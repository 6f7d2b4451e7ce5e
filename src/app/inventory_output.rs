//! `--list` and `--json` renderings of a scan inventory.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoindex_core::FileEntry;
use autoindex_core::format::{format_size, truncate_name};
use autoindex_core::scan::display_path;
use serde::Serialize;

/// Longest file name shown in `--list` output before truncation.
const MAX_NAME_WIDTH: usize = 60;

/// Human-readable inventory, one block per folder, both sorted by name.
pub(crate) fn render_listing(files: &[Arc<FileEntry>]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&FileEntry>> = BTreeMap::new();
    for entry in files {
        grouped
            .entry(entry.folder_path.as_str())
            .or_default()
            .push(entry);
    }

    let mut out = String::new();
    for (folder, mut entries) in grouped {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let _ = writeln!(out, "{}/ ({} files)", display_path(folder), entries.len());
        for entry in entries {
            let name = truncate_name(&entry.name, MAX_NAME_WIDTH);
            match entry.size_hint {
                Some(size) => {
                    let _ = writeln!(out, "  {name}  [{}]", format_size(size));
                }
                None => {
                    let _ = writeln!(out, "  {name}");
                }
            }
        }
    }
    let _ = writeln!(out, "{} files", files.len());
    out
}

#[derive(Serialize)]
struct JsonInventory<'a> {
    root_url: &'a str,
    total_files: usize,
    total_size: Option<u64>,
    files: &'a [Arc<FileEntry>],
}

/// Machine-readable inventory. `total_size` is present only when every file
/// has a size hint.
pub(crate) fn render_json(root_url: &str, files: &[Arc<FileEntry>]) -> Result<String> {
    let total_size = files
        .iter()
        .map(|entry| entry.size_hint)
        .sum::<Option<u64>>();
    let inventory = JsonInventory {
        root_url,
        total_files: files.len(),
        total_size,
        files,
    };
    serde_json::to_string_pretty(&inventory).context("Failed to serialize inventory")
}
