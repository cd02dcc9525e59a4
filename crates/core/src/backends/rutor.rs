//! Rutor search backend implementation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::RutorConfig;
use crate::search::{Backend, BackendError, TorrentRecord};

use super::http::{build_client, parse_peers, read_page, unescape_html};

/// One result row: magnet, title, size, seeders, leechers.
static ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"tr class="(?:gai|tum)".+?"(magnet.+?)".+?<a href=".+?">(.+?)</a>.+?<td align="right">?(\d+?\.\d+?.+?)</td.+?alt="S" />(.+?)</span>.+?<span class="red">(.+?)</span>"#,
    )
    .expect("rutor row pattern is valid")
});

/// Rutor search backend implementation.
///
/// The site is frequently blocked; when the active address fails, the
/// configured mirrors are probed in order and the first reachable one is
/// used from then on.
pub struct RutorBackend {
    client: Client,
    config: RutorConfig,
    active_url: RwLock<String>,
}

impl RutorBackend {
    /// Create a new RutorBackend with the given configuration.
    pub fn new(config: RutorConfig) -> Result<Self, BackendError> {
        let client = build_client(config.timeout_secs)?;
        let active_url = RwLock::new(config.url.trim_end_matches('/').to_string());
        Ok(Self {
            client,
            config,
            active_url,
        })
    }

    /// Address currently used for searches.
    pub async fn active_url(&self) -> String {
        self.active_url.read().await.clone()
    }

    fn build_search_url(base: &str, query: &str) -> String {
        format!("{}/search/0/0/100/2/{}", base, urlencoding::encode(query))
    }

    async fn search_at(&self, base: &str, query: &str) -> Result<Vec<TorrentRecord>, BackendError> {
        let body = read_page(&self.client, &Self::build_search_url(base, query)).await?;
        let records = parse_results(&body);
        debug!(base = base, results = records.len(), "Rutor search complete");
        Ok(records)
    }

    /// Probe the primary address and mirrors, skipping `failed`.
    async fn find_mirror(&self, failed: &str) -> Option<String> {
        let candidates = std::iter::once(&self.config.url)
            .chain(self.config.mirrors.iter())
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| *u != failed);

        for candidate in candidates {
            debug!(mirror = candidate, "Checking rutor mirror");
            if read_page(&self.client, candidate).await.is_ok() {
                return Some(candidate.to_string());
            }
        }
        None
    }
}

#[async_trait]
impl Backend for RutorBackend {
    fn name(&self) -> &str {
        "rutor"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, BackendError> {
        let base = self.active_url().await;

        match self.search_at(&base, query).await {
            Ok(records) => Ok(records),
            Err(e) => {
                warn!(base = %base, error = %e, "Rutor unreachable, looking for a mirror");
                let Some(mirror) = self.find_mirror(&base).await else {
                    return Err(e);
                };
                info!(mirror = %mirror, "Switching rutor to mirror");
                *self.active_url.write().await = mirror.clone();
                self.search_at(&mirror, query).await
            }
        }
    }
}

/// Extract result rows from a rutor search page.
pub fn parse_results(html: &str) -> Vec<TorrentRecord> {
    let html = html.replace('\n', " ");
    ROW.captures_iter(&html)
        .map(|c| TorrentRecord {
            magnet: unescape_html(&c[1]),
            name: unescape_html(&c[2]).trim().to_string(),
            size: unescape_html(&c[3]).trim().to_string(),
            seeders: parse_peers(&unescape_html(&c[4])),
            leechers: parse_peers(&unescape_html(&c[5])),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<table width="100%"><tr class="backgr"><td>Добавлен</td></tr>
<tr class="gai"><td>13&nbsp;Окт&nbsp;17</td><td ><a class="downgif" href="/download/1"><img src="/s/i/d.gif" alt="D" /></a><a href="magnet:?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa&amp;dn=rutor.info&amp;tr=udp://opentor.org:2710"><img src="/s/i/m.png" alt="M" /></a>
<a href="/torrent/1/movie">Movie (2017) BDRip 1080p</a></td> <td align="right">2&nbsp;<img src="/s/t/com.gif" alt="C" /></td><td align="right">14.55&nbsp;GB</td><td align="center"><span class="green"><img src="/s/t/arrowup.gif" alt="S" />&nbsp;120</span>&nbsp;<img src="/s/t/arrowdown.gif" alt="L" /><span class="red">&nbsp;15</span></td></tr>
<tr class="tum"><td>12&nbsp;Окт&nbsp;17</td><td ><a href="magnet:?xt=urn:btih:bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"><img src="/s/i/m.png" alt="M" /></a>
<a href="/torrent/2/movie">Фильм (2017) WEB-DL 720p</a></td><td align="right">3.10&nbsp;ГБ</td><td align="center"><span class="green"><img src="/s/t/arrowup.gif" alt="S" />&nbsp;n/a</span>&nbsp;<span class="red">&nbsp;4</span></td></tr>
</table>"#;

    #[test]
    fn test_parse_results() {
        let records = parse_results(PAGE);

        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "Movie (2017) BDRip 1080p");
        assert_eq!(records[0].size, "14.55 GB");
        assert_eq!(records[0].seeders, Some(120));
        assert_eq!(records[0].leechers, Some(15));
        assert_eq!(
            records[0].magnet,
            "magnet:?xt=urn:btih:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa&dn=rutor.info&tr=udp://opentor.org:2710"
        );

        assert_eq!(records[1].name, "Фильм (2017) WEB-DL 720p");
        assert_eq!(records[1].size, "3.10 ГБ");
        assert_eq!(records[1].seeders, None);
        assert_eq!(records[1].leechers, Some(4));
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>Ничего не найдено</body></html>").is_empty());
    }

    #[test]
    fn test_build_search_url() {
        assert_eq!(
            RutorBackend::build_search_url("http://rutor.info", "the matrix"),
            "http://rutor.info/search/0/0/100/2/the%20matrix"
        );
    }

    #[tokio::test]
    async fn test_new_trims_trailing_slash() {
        let backend = RutorBackend::new(RutorConfig {
            url: "http://rutor.example/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.active_url().await, "http://rutor.example");
        assert_eq!(backend.name(), "rutor");
    }
}
