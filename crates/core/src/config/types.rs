use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::search::{SizeTiebreak, UnresolvedPolicy};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8090
}

/// Search pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Upper bound on each backend's search, applied independently (default: 30)
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,
    /// What to do with records whose link has no info hash (default: drop)
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,
    /// Ordering inside a size bucket when seeders are unknown (default: numeric)
    #[serde(default)]
    pub size_tiebreak: SizeTiebreak,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            backend_timeout_secs: default_backend_timeout(),
            unresolved: UnresolvedPolicy::default(),
            size_tiebreak: SizeTiebreak::default(),
        }
    }
}

fn default_backend_timeout() -> u64 {
    30
}

/// Per-backend configuration. Every backend is enabled by default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendsConfig {
    #[serde(default)]
    pub rutor: RutorConfig,
    #[serde(default)]
    pub yohoho: YohohoConfig,
    #[serde(default)]
    pub tparser: TParserConfig,
}

/// Rutor backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RutorConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Primary site URL
    #[serde(default = "default_rutor_url")]
    pub url: String,
    /// Mirrors probed in order when the primary site is unreachable
    #[serde(default = "default_rutor_mirrors")]
    pub mirrors: Vec<String>,
    /// HTTP timeout in seconds (default: 5)
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u32,
}

impl Default for RutorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_rutor_url(),
            mirrors: default_rutor_mirrors(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_rutor_url() -> String {
    "http://rutor.info".to_string()
}

fn default_rutor_mirrors() -> Vec<String> {
    [
        "http://top-tor.org",
        "http://free-ru.org",
        "http://zerkalo-rutor.org",
        "http://free-rutor.org",
        "http://fast-bit.org",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// YoHoHo backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YohohoConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_yohoho_url")]
    pub url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u32,
}

impl Default for YohohoConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            url: default_yohoho_url(),
            timeout_secs: default_http_timeout(),
        }
    }
}

fn default_yohoho_url() -> String {
    "https://4h0y.yohoho.cc".to_string()
}

/// TParser backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TParserConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// JSONP endpoints queried in parallel, one per tracker group
    #[serde(default = "default_tparser_shards")]
    pub shards: Vec<TParserShard>,
    /// Redirect endpoint that turns a result token into a magnet URI
    #[serde(default = "default_tparser_magnet_url")]
    pub magnet_url: String,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u32,
}

impl Default for TParserConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            shards: default_tparser_shards(),
            magnet_url: default_tparser_magnet_url(),
            timeout_secs: default_http_timeout(),
        }
    }
}

/// One TParser endpoint: `http://js{host}.tparser.org/js{host}/{script}.tor.php`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TParserShard {
    pub host: u32,
    pub script: u32,
}

fn default_tparser_shards() -> Vec<TParserShard> {
    vec![
        TParserShard { host: 2, script: 4 },
        TParserShard { host: 3, script: 6 },
        TParserShard { host: 5, script: 9 },
    ]
}

fn default_tparser_magnet_url() -> String {
    "http://tparser.org/magnet.php".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_http_timeout() -> u32 {
    5
}
