//! Anchor extraction and folder/file classification for listing pages.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

/// Anchors with an `href` attribute.
#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href]").expect("anchor selector is valid") // Static pattern, safe to panic
});

/// Self and parent references every autoindex page carries.
const SKIPPED_HREFS: &[&str] = &["../", "./"];

/// A single classified link from a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRef {
    /// Display name: last path segment, trailing slash stripped, percent-decoded.
    pub name: String,
    /// Absolute URL after resolving the href against the page URL.
    pub url: Url,
}

/// Links found on one listing page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingLinks {
    /// Links whose href ends in `/`.
    pub folders: Vec<LinkRef>,
    /// Every other link. No extension filtering is applied here.
    pub files: Vec<LinkRef>,
}

impl ListingLinks {
    /// Returns true if the page contained no usable links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Parses listing markup into folder and file links.
///
/// Every `<a href>` is resolved against `base_url` with standard URL-join
/// semantics, so relative references become absolute and absolute hrefs pass
/// through unchanged. An href ending in `/` is a folder, anything else a file.
///
/// Skipped links:
/// - `../` and `./`
/// - empty, fragment-only (`#top`) and query-only (`?C=N;O=D`) hrefs
/// - hrefs resolving to a non-HTTP scheme (`mailto:`, `javascript:`)
///
/// This never fails. Malformed markup yields whatever anchors the HTML5
/// parser recovers, possibly none.
#[tracing::instrument(skip(html), fields(base = %base_url, html_len = html.len()))]
#[must_use]
pub fn parse_listing(html: &str, base_url: &Url) -> ListingLinks {
    let document = Html::parse_document(html);
    let mut links = ListingLinks::default();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if is_skipped_href(href) {
            trace!(href, "skipping navigation href");
            continue;
        }

        let Ok(resolved) = base_url.join(href) else {
            debug!(href, "href does not resolve against base URL");
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            trace!(href, scheme = resolved.scheme(), "skipping non-HTTP link");
            continue;
        }

        let Some(name) = link_name(&resolved) else {
            continue;
        };

        let link = LinkRef {
            name,
            url: resolved,
        };
        if href.ends_with('/') {
            links.folders.push(link);
        } else {
            links.files.push(link);
        }
    }

    debug!(
        folders = links.folders.len(),
        files = links.files.len(),
        "parsed listing page"
    );
    links
}

fn is_skipped_href(href: &str) -> bool {
    href.is_empty()
        || SKIPPED_HREFS.contains(&href)
        || href.starts_with('#')
        || href.starts_with('?')
}

/// Derives the display name from the last non-empty path segment.
fn link_name(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?;
    let decoded = urlencoding::decode(segment).map_or_else(
        |_| segment.to_string(),
        std::borrow::Cow::into_owned,
    );
    Some(decoded)
}
