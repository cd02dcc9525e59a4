//! TParser search backend implementation.
//!
//! TParser aggregates several trackers behind JSONP endpoints. Results carry
//! an opaque token instead of a magnet; the magnet is obtained from the
//! `Location` header of a redirect endpoint.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{TParserConfig, TParserShard};
use crate::search::{Backend, BackendError, TorrentRecord};

use super::http::{build_client, build_no_redirect_client, parse_peers, read_page};

/// TParser search backend implementation.
pub struct TParserBackend {
    client: Client,
    redirect_client: Client,
    config: TParserConfig,
}

/// JSONP payload of one shard.
#[derive(Debug, Deserialize)]
struct ShardResponse {
    #[serde(default)]
    sr: Vec<ShardResult>,
}

#[derive(Debug, Deserialize)]
struct ShardResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    size: String,
    /// Size unit
    #[serde(default)]
    t: String,
    #[serde(default)]
    s: String,
    #[serde(default)]
    l: String,
    #[serde(default)]
    img: String,
    #[serde(default)]
    d: String,
    /// "1" for entries that can be resolved to a magnet
    #[serde(default)]
    z: String,
}

impl TParserBackend {
    pub fn new(config: TParserConfig) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            redirect_client: build_no_redirect_client(config.timeout_secs)?,
            config,
        })
    }

    fn build_shard_url(shard: &TParserShard, query: &str) -> String {
        format!(
            "http://js{host}.tparser.org/js{host}/{script}.tor.php?callback=one&jsonpx={query}&s=1",
            host = shard.host,
            script = shard.script,
            query = urlencoding::encode(query)
        )
    }

    fn build_magnet_url(&self, img: &str, d: &str) -> String {
        format!("{}?t={}{}{}", self.config.magnet_url, img.len(), img, d)
    }

    /// Follow the redirect endpoint one hop and read the magnet from it.
    async fn resolve_magnet(&self, img: &str, d: &str) -> Result<String, BackendError> {
        let url = self.build_magnet_url(img, d);
        let response = self.redirect_client.get(&url).send().await?;

        if response.status().is_redirection() {
            let headers = response.headers();
            let location = headers
                .get(reqwest::header::LOCATION)
                .or_else(|| headers.get(reqwest::header::CONTENT_LOCATION))
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty());
            if let Some(magnet) = location {
                return Ok(magnet.to_string());
            }
        }

        Err(BackendError::Parse(format!("Magnet not found at {}", url)))
    }

    async fn search_shard(
        &self,
        shard: &TParserShard,
        query: &str,
    ) -> Result<Vec<TorrentRecord>, BackendError> {
        let body = read_page(&self.client, &Self::build_shard_url(shard, query)).await?;
        let entries = parse_shard(&body)?;

        let resolved = join_all(entries.into_iter().map(|(record, img, d)| async move {
            self.resolve_magnet(&img, &d)
                .await
                .map(|magnet| TorrentRecord { magnet, ..record })
        }))
        .await;

        let mut records = Vec::with_capacity(resolved.len());
        let mut last_error = None;
        for result in resolved {
            match result {
                Ok(record) => records.push(record),
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) if records.is_empty() => Err(e),
            _ => Ok(records),
        }
    }
}

#[async_trait]
impl Backend for TParserBackend {
    fn name(&self) -> &str {
        "tparser"
    }

    async fn search(&self, query: &str) -> Result<Vec<TorrentRecord>, BackendError> {
        let results = join_all(
            self.config
                .shards
                .iter()
                .map(|shard| self.search_shard(shard, query)),
        )
        .await;

        let mut records = Vec::new();
        let mut last_error = None;
        for (shard, result) in self.config.shards.iter().zip(results) {
            match result {
                Ok(mut found) => records.append(&mut found),
                Err(e) => {
                    warn!(host = shard.host, script = shard.script, error = %e, "TParser shard failed");
                    last_error = Some(e);
                }
            }
        }

        debug!(results = records.len(), "TParser search complete");

        // A partial answer is still an answer
        match last_error {
            Some(e) if records.is_empty() => Err(e),
            _ => Ok(records),
        }
    }
}

/// Parse one shard's JSONP body into records (without magnets) plus the
/// token pair used to resolve each magnet.
fn parse_shard(body: &str) -> Result<Vec<(TorrentRecord, String, String)>, BackendError> {
    let start = body.find('(').map(|i| i + 1).unwrap_or(0);
    let end = body.rfind(')').filter(|&i| i >= start).unwrap_or(body.len());
    let json = body[start..end].replace('\'', "\"");

    let response: ShardResponse = serde_json::from_str(&json)
        .map_err(|e| BackendError::Parse(format!("Invalid TParser payload: {}", e)))?;

    Ok(response
        .sr
        .into_iter()
        .filter(|r| r.z == "1")
        .map(|r| {
            let record = TorrentRecord {
                name: r.name.replace("<b>", "").replace("</b>", ""),
                magnet: String::new(),
                size: format!("{} {}", r.size, r.t).trim().to_string(),
                seeders: parse_peers(&r.s),
                leechers: parse_peers(&r.l),
            };
            (record, r.img, r.d)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shard() {
        let body = "one({'sr':[\
            {'name':'<b>Movie</b> 2017 1080p','size':'14.2','t':'GB','s':'31','l':'4','img':'abc','d':'77','z':'1'},\
            {'name':'Hidden','size':'1','t':'GB','s':'1','l':'1','img':'x','d':'y','z':'0'},\
            {'name':'Movie 2017 CAMRip','size':'700','t':'MB','s':'','l':'-','img':'def','d':'88','z':'1'}\
        ]})";
        let entries = parse_shard(body).unwrap();

        assert_eq!(entries.len(), 2);
        let (record, img, d) = &entries[0];
        assert_eq!(record.name, "Movie 2017 1080p");
        assert_eq!(record.size, "14.2 GB");
        assert_eq!(record.seeders, Some(31));
        assert_eq!(record.leechers, Some(4));
        assert_eq!(img, "abc");
        assert_eq!(d, "77");

        let (record, _, _) = &entries[1];
        assert_eq!(record.size, "700 MB");
        assert_eq!(record.seeders, None);
        assert_eq!(record.leechers, None);
    }

    #[test]
    fn test_parse_shard_empty_results() {
        assert!(parse_shard("one({'sr':[]})").unwrap().is_empty());
        assert!(parse_shard("one({})").unwrap().is_empty());
    }

    #[test]
    fn test_parse_shard_invalid_payload() {
        assert!(matches!(
            parse_shard("<html>502 Bad Gateway</html>"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn test_build_urls() {
        let backend = TParserBackend::new(TParserConfig::default()).unwrap();
        assert_eq!(
            TParserBackend::build_shard_url(&TParserShard { host: 2, script: 4 }, "matrix 1999"),
            "http://js2.tparser.org/js2/4.tor.php?callback=one&jsonpx=matrix%201999&s=1"
        );
        assert_eq!(
            backend.build_magnet_url("abcd", "9"),
            "http://tparser.org/magnet.php?t=4abcd9"
        );
    }
}
