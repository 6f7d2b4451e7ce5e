//! Human-readable rendering of speeds, sizes and long names.

/// Bytes per second as `B/s`, `KB/s` or `MB/s` with one decimal.
///
/// ```
/// use autoindex_core::format::format_speed;
///
/// assert_eq!(format_speed(512.0), "512.0 B/s");
/// assert_eq!(format_speed(1536.0), "1.5 KB/s");
/// ```
#[must_use]
pub fn format_speed(bytes_per_sec: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if bytes_per_sec < KB {
        format!("{bytes_per_sec:.1} B/s")
    } else if bytes_per_sec < MB {
        format!("{:.1} KB/s", bytes_per_sec / KB)
    } else {
        format!("{:.1} MB/s", bytes_per_sec / MB)
    }
}

/// Byte count as `B`, `KB`, `MB` or `GB`.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Shortens `name` to at most `max_length` characters, ending in `...`.
///
/// Counts characters, not bytes, so multi-byte names are never split.
#[must_use]
pub fn truncate_name(name: &str, max_length: usize) -> String {
    const ELLIPSIS: &str = "...";

    if name.chars().count() <= max_length {
        return name.to_string();
    }
    if max_length <= ELLIPSIS.len() {
        return name.chars().take(max_length).collect();
    }

    let kept: String = name.chars().take(max_length - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}
