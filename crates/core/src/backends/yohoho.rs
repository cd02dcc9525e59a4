//! YoHoHo search backend implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use tracing::debug;

use crate::config::YohohoConfig;
use crate::search::{Backend, BackendError, TorrentRecord};

use super::http::{build_client, read_page, unescape_html};

/// One result button: magnet, title, size. The site reports no peer counts.
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<span class="td-btn" onclick="window\.location\.href =.+?'(magnet:\?.+?)';">(.+?)</span>.+?<div.+?>(.+?)<"#,
    )
    .expect("yohoho row pattern is valid")
});

/// YoHoHo search backend implementation.
pub struct YohohoBackend {
    client: Client,
    base_url: String,
}

impl YohohoBackend {
    pub fn new(config: YohohoConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn build_search_url(&self, query: &str) -> String {
        format!("{}/?title={}", self.base_url, urlencoding::encode(query))
    }
}

#[async_trait]
impl Backend for YohohoBackend {
    fn name(&self) -> &str {
        "yohoho"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, BackendError> {
        let body = read_page(&self.client, &self.build_search_url(query)).await?;
        let records = parse_results(&body);
        debug!(results = records.len(), "YoHoHo search complete");
        Ok(records)
    }
}

/// Extract result rows from a YoHoHo search page.
pub fn parse_results(html: &str) -> Vec<TorrentRecord> {
    let html = html.replace('\n', " ");
    ROW.captures_iter(&html)
        .map(|c| TorrentRecord {
            magnet: unescape_html(&c[1]),
            name: unescape_html(&c[2]).trim().to_string(),
            size: unescape_html(&c[3]).trim().to_string(),
            seeders: None,
            leechers: None,
        })
        .collect()
}
