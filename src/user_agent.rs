//! User-Agent string shared by listing and download requests.

/// Product token sent in every request.
const PRODUCT: &str = "autoindex-downloader";

/// Default User-Agent identifying the tool and its version.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (directory-listing crawler)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_crate_version() {
        let ua = default_user_agent();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("autoindex-downloader/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
            "UA must contain crate version"
        );
    }

    #[test]
    fn test_user_agent_is_stable_across_calls() {
        assert_eq!(default_user_agent(), default_user_agent());
    }
}
