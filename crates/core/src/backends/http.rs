//! Shared HTTP plumbing for the scraping backends.

use std::time::Duration;

use reqwest::{redirect, Client};
use tracing::debug;

use crate::search::BackendError;

/// Several index sites refuse requests without a browser user agent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.8; rv:21.0) Gecko/20100101 Firefox/21.0";

/// Build the HTTP client a backend uses for page fetches.
pub fn build_client(timeout_secs: u32) -> Result<Client, BackendError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(u64::from(timeout_secs)))
        .build()
        .map_err(|e| BackendError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Build a client that reports redirects instead of following them.
pub fn build_no_redirect_client(timeout_secs: u32) -> Result<Client, BackendError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(u64::from(timeout_secs)))
        .redirect(redirect::Policy::none())
        .build()
        .map_err(|e| BackendError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// GET `url` and return the body as text.
///
/// The body is decoded using the charset from `Content-Type`, so
/// windows-1251 pages arrive as proper UTF-8.
pub async fn read_page(client: &Client, url: &str) -> Result<String, BackendError> {
    debug!(url = url, "Fetching page");

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "*/*")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(BackendError::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        });
    }

    Ok(response.text().await?)
}

/// Decode the handful of HTML entities the index pages actually emit.
pub fn unescape_html(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parse a peer count cell; anything that is not a non-negative integer is unknown.
pub fn parse_peers(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("1.46&nbsp;GB"), "1.46 GB");
        assert_eq!(
            unescape_html("magnet:?xt=urn:btih:abc&amp;dn=x&amp;tr=y"),
            "magnet:?xt=urn:btih:abc&dn=x&tr=y"
        );
        assert_eq!(unescape_html("&amp;nbsp;"), "&nbsp;");
    }

    #[test]
    fn test_parse_peers() {
        assert_eq!(parse_peers(" 12 "), Some(12));
        assert_eq!(parse_peers("0"), Some(0));
        assert_eq!(parse_peers("-1"), None);
        assert_eq!(parse_peers("n/a"), None);
        assert_eq!(parse_peers(""), None);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(5).is_ok());
        assert!(build_no_redirect_client(5).is_ok());
    }
}
