//! Directory-listing page parsing.
//!
//! This module turns the markup of one autoindex page (the HTML that Apache,
//! Nginx and most static file servers generate for a directory) into
//! classified links, and decides which of the linked files are worth
//! downloading.
//!
//! # Example
//!
//! ```
//! use autoindex_core::parser::{ExtensionFilter, parse_listing};
//! use url::Url;
//!
//! let base = Url::parse("http://mirror.example/pub/").unwrap();
//! let html = r#"<a href="../">..</a><a href="iso/">iso/</a><a href="notes.txt">notes</a>"#;
//!
//! let links = parse_listing(html, &base);
//! assert_eq!(links.folders[0].name, "iso");
//! assert!(ExtensionFilter::default().allows(&links.files[0].name));
//! ```

mod filter;
mod listing;

pub use filter::{DEFAULT_EXTENSIONS, ExtensionFilter};
pub use listing::{LinkRef, ListingLinks, parse_listing};
