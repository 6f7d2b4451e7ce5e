//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Crawl an HTTP directory listing and download the files it links to.
///
/// Scans the listing tree under URL depth-first, then downloads every file
/// with a known extension (or those matching --match) into the output
/// directory, mirroring the remote folder layout.
#[derive(Parser, Debug)]
#[command(name = "autoindex")]
#[command(author, version, about)]
pub struct Args {
    /// Root directory-listing URL to scan
    pub url: String,

    /// Destination directory [default: ./downloaded_files]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum concurrent downloads (1-16) [default: 3]
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: Option<u8>,

    /// Deepest folder level to visit; the root is level 0 [default: 15]
    #[arg(short = 'd', long)]
    pub max_depth: Option<usize>,

    /// Only download files whose path (folder/name) matches this regex
    #[arg(short = 'm', long = "match", value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Print the discovered files grouped by folder and exit
    #[arg(long)]
    pub list: bool,

    /// Print the discovered inventory as JSON and exit
    #[arg(long, conflicts_with = "list")]
    pub json: bool,

    /// Send a HEAD request per file to learn its size while scanning
    #[arg(long)]
    pub probe_sizes: bool,

    /// Total timeout per listing page in seconds (1-3600) [default: 10]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub page_timeout: Option<u64>,

    /// Idle read timeout while downloading in seconds (1-3600) [default: 30]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
