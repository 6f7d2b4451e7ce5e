//! Merges command-line arguments with file config into one run description.
//!
//! Precedence for every value: command line, then config file, then the
//! library default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use autoindex_core::scan::DEFAULT_MAX_DEPTH;
use autoindex_core::{ClientTimeouts, DEFAULT_CONCURRENCY};
use regex::Regex;

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Output directory used when neither `-o` nor `output_dir` is set.
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "./downloaded_files";

/// What to do with the inventory once the scan is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputMode {
    Download,
    List,
    Json,
}

#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) url: String,
    pub(crate) output_dir: PathBuf,
    pub(crate) concurrency: usize,
    pub(crate) max_depth: usize,
    pub(crate) probe_sizes: bool,
    pub(crate) pattern: Option<Regex>,
    pub(crate) mode: OutputMode,
    pub(crate) timeouts: ClientTimeouts,
}

impl RunSettings {
    /// Whether `relative_path` (folder path + name) is selected for download.
    pub(crate) fn selects(&self, relative_path: &str) -> bool {
        self.pattern
            .as_ref()
            .is_none_or(|pattern| pattern.is_match(relative_path))
    }
}

pub(crate) fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Result<RunSettings> {
    let pattern = args
        .pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("Invalid --match pattern")?;

    let mode = if args.json {
        OutputMode::Json
    } else if args.list {
        OutputMode::List
    } else {
        OutputMode::Download
    };

    let defaults = ClientTimeouts::default();
    let page_secs = args
        .page_timeout
        .or_else(|| file.and_then(|f| f.page_timeout_secs));
    let read_secs = args
        .read_timeout
        .or_else(|| file.and_then(|f| f.read_timeout_secs));
    let timeouts = ClientTimeouts {
        connect: defaults.connect,
        read: read_secs.map_or(defaults.read, Duration::from_secs),
        page: page_secs.map_or(defaults.page, Duration::from_secs),
    };

    Ok(RunSettings {
        url: args.url.clone(),
        output_dir: args
            .output
            .clone()
            .or_else(|| file.and_then(|f| f.output_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
        concurrency: args
            .concurrency
            .or_else(|| file.and_then(|f| f.concurrency))
            .map_or(DEFAULT_CONCURRENCY, usize::from),
        max_depth: args
            .max_depth
            .or_else(|| file.and_then(|f| f.max_depth))
            .unwrap_or(DEFAULT_MAX_DEPTH),
        probe_sizes: args.probe_sizes || file.and_then(|f| f.probe_sizes).unwrap_or(false),
        pattern,
        mode,
        timeouts,
    })
}

/// Log level when `RUST_LOG` is unset: `-q`, then `-v`, then config verbosity.
pub(crate) fn resolve_default_log_level(args: &Args, file: Option<&FileConfig>) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbose {
        0 => file
            .and_then(|f| f.verbosity)
            .map_or("info", |verbosity| verbosity.log_level()),
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::app_config::VerbositySetting;

    const URL: &str = "http://mirror.example/pub/";

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["autoindex", URL];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_without_config() {
        let settings = resolve_settings(&args(&[]), None).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(settings.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(settings.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(settings.mode, OutputMode::Download);
        assert_eq!(settings.timeouts, ClientTimeouts::default());
        assert!(!settings.probe_sizes);
        assert!(settings.selects("anything/at/all.zip"));
    }

    #[test]
    fn test_config_fills_unset_values() {
        let file = FileConfig {
            output_dir: Some(PathBuf::from("/srv/mirror")),
            concurrency: Some(6),
            max_depth: Some(2),
            page_timeout_secs: Some(4),
            probe_sizes: Some(true),
            ..FileConfig::default()
        };
        let settings = resolve_settings(&args(&[]), Some(&file)).unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("/srv/mirror"));
        assert_eq!(settings.concurrency, 6);
        assert_eq!(settings.max_depth, 2);
        assert_eq!(settings.timeouts.page, Duration::from_secs(4));
        assert!(settings.probe_sizes);
    }

    #[test]
    fn test_command_line_overrides_config() {
        let file = FileConfig {
            concurrency: Some(6),
            max_depth: Some(2),
            ..FileConfig::default()
        };
        let settings =
            resolve_settings(&args(&["-c", "1", "--max-depth", "9"]), Some(&file)).unwrap();
        assert_eq!(settings.concurrency, 1);
        assert_eq!(settings.max_depth, 9);
    }

    #[test]
    fn test_match_pattern_selects_relative_path() {
        let settings = resolve_settings(&args(&["--match", r"^iso/.*\.iso$"]), None).unwrap();
        assert!(settings.selects("iso/debian.iso"));
        assert!(!settings.selects("docs/readme.txt"));
    }

    #[test]
    fn test_invalid_match_pattern_is_error() {
        let err = resolve_settings(&args(&["--match", "("]), None).unwrap_err();
        assert!(err.to_string().contains("--match"));
    }

    #[test]
    fn test_output_modes() {
        assert_eq!(
            resolve_settings(&args(&["--list"]), None).unwrap().mode,
            OutputMode::List
        );
        assert_eq!(
            resolve_settings(&args(&["--json"]), None).unwrap().mode,
            OutputMode::Json
        );
    }

    #[test]
    fn test_log_level_precedence() {
        let quiet_file = FileConfig {
            verbosity: Some(VerbositySetting::Quiet),
            ..FileConfig::default()
        };
        assert_eq!(resolve_default_log_level(&args(&[]), None), "info");
        assert_eq!(resolve_default_log_level(&args(&[]), Some(&quiet_file)), "error");
        assert_eq!(resolve_default_log_level(&args(&["-v"]), Some(&quiet_file)), "debug");
        assert_eq!(resolve_default_log_level(&args(&["-vv"]), None), "trace");
        assert_eq!(resolve_default_log_level(&args(&["-q", "-v"]), None), "error");
    }
}
