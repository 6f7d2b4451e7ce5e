//! Extension allow-list for downloadable files.

/// Extensions accepted by [`ExtensionFilter::default`].
///
/// Covers archives, documents, media and code/script files. Web pages
/// (`.html`, `.htm`) are intentionally absent: on a listing server they are
/// almost always index or readme pages rather than payload.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    // Archives and installers
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".exe",
    // Documents
    ".pdf", ".txt", ".doc", ".docx", ".xlsx", ".pptx",
    // Video
    ".mp4", ".avi", ".mkv", ".wmv", ".mov", ".flv",
    // Audio
    ".mp3", ".wav", ".flac", ".aac", ".ogg",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp",
    // Code and scripts
    ".dll", ".bat", ".sh", ".py", ".js", ".css",
];

/// Case-insensitive suffix matcher over a list of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    /// Lowercased extensions, each starting with `.`.
    extensions: Vec<String>,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied())
    }
}

impl ExtensionFilter {
    /// Builds a filter from extensions with or without a leading dot.
    ///
    /// Blank entries are ignored, so an all-blank list accepts nothing.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().to_ascii_lowercase())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self { extensions }
    }

    /// Returns true if `name` ends with one of the allowed extensions.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        let lowered = name.to_ascii_lowercase();
        self.extensions.iter().any(|ext| lowered.ends_with(ext))
    }

    /// The normalized extension list.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}
