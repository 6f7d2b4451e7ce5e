//! Mock autoindex server helpers.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Apache-style autoindex page: parent link, column-sort links, then `entries`.
#[must_use]
pub fn autoindex_page(title: &str, entries: &[&str]) -> String {
    let mut rows = String::new();
    for entry in entries {
        rows.push_str(&format!(
            "<tr><td><a href=\"{entry}\">{entry}</a></td><td>2024-01-01 00:00</td><td>-</td></tr>\n"
        ));
    }
    format!(
        "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 3.2 Final//EN\">\n\
         <html><head><title>Index of {title}</title></head><body>\n\
         <h1>Index of {title}</h1>\n<table>\n\
         <tr><th><a href=\"?C=N;O=D\">Name</a></th><th><a href=\"?C=M;O=A\">Last modified</a></th></tr>\n\
         <tr><td><a href=\"../\">Parent Directory</a></td></tr>\n\
         {rows}</table></body></html>\n"
    )
}

/// Serves a listing of `entries` at `listing_path` (which should end in `/`).
pub async fn mount_listing(server: &MockServer, listing_path: &str, entries: &[&str]) {
    mount_listing_delayed(server, listing_path, entries, Duration::ZERO).await;
}

pub async fn mount_listing_delayed(
    server: &MockServer,
    listing_path: &str,
    entries: &[&str],
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(listing_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(autoindex_page(listing_path, entries), "text/html")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Serves `body` for GET `file_path`.
pub async fn mount_file(server: &MockServer, file_path: &str, body: Vec<u8>) {
    mount_file_delayed(server, file_path, body, Duration::ZERO).await;
}

pub async fn mount_file_delayed(
    server: &MockServer,
    file_path: &str,
    body: Vec<u8>,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Answers GET `request_path` with `status` and no body.
pub async fn mount_status(server: &MockServer, request_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(request_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Root listing URL of `server`, with the trailing slash listings need.
#[must_use]
pub fn root_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}
