//! Magnet URI parsing and serialization.
//!
//! The canonical form written by [`Magnet::to_uri`] is
//! `magnet:?xt=urn:btih:<hex>&dn=<name>&tr=<tracker>...`; v2 hashes use
//! `urn:btmh:1220<hex>`. Parsing accepts hex or base32 `btih` values and
//! ignores parameters it does not know about.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

const MAGNET_PREFIX: &str = "magnet:?";
const BTIH_PREFIX: &str = "urn:btih:";
const BTMH_PREFIX: &str = "urn:btmh:";
/// Multihash header for sha2-256 with a 32-byte digest.
const SHA256_MULTIHASH: &str = "1220";

/// Errors that can occur when parsing a magnet URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MagnetError {
    #[error("Not a magnet URI")]
    NotMagnet,

    #[error("Magnet URI has no supported info hash")]
    MissingInfoHash,

    #[error("Invalid info hash: {0}")]
    InvalidInfoHash(String),
}

/// BitTorrent content identity: a v1 (SHA-1) or v2 (SHA-256) info hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoHash {
    V1([u8; 20]),
    V2([u8; 32]),
}

impl InfoHash {
    /// Parse the value of a `urn:btih:` parameter (40 hex or 32 base32 chars).
    pub fn from_btih(value: &str) -> Result<Self, MagnetError> {
        let mut bytes = [0u8; 20];
        match value.len() {
            40 => hex::decode_to_slice(value, &mut bytes)
                .map_err(|_| MagnetError::InvalidInfoHash(value.to_string()))?,
            32 => decode_base32(value, &mut bytes)?,
            _ => return Err(MagnetError::InvalidInfoHash(value.to_string())),
        }
        Ok(InfoHash::V1(bytes))
    }

    /// Parse the value of a `urn:btmh:` parameter (sha2-256 multihash).
    pub fn from_btmh(value: &str) -> Result<Self, MagnetError> {
        let digest = value
            .strip_prefix(SHA256_MULTIHASH)
            .filter(|d| d.len() == 64)
            .ok_or_else(|| MagnetError::InvalidInfoHash(value.to_string()))?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digest, &mut bytes)
            .map_err(|_| MagnetError::InvalidInfoHash(value.to_string()))?;
        Ok(InfoHash::V2(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            InfoHash::V1(b) => b,
            InfoHash::V2(b) => b,
        }
    }

    /// Lowercase hex of the digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    fn urn(&self) -> String {
        match self {
            InfoHash::V1(_) => format!("{}{}", BTIH_PREFIX, self.to_hex()),
            InfoHash::V2(_) => format!("{}{}{}", BTMH_PREFIX, SHA256_MULTIHASH, self.to_hex()),
        }
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A parsed magnet link: identity, display-name hint and trackers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magnet {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub trackers: Vec<String>,
}

impl Magnet {
    pub fn new(info_hash: InfoHash) -> Self {
        Self {
            info_hash,
            display_name: None,
            trackers: Vec::new(),
        }
    }

    /// Parse a magnet URI.
    ///
    /// Hybrid magnets carrying both `btih` and `btmh` resolve to the v1 hash so
    /// they merge with v1-only listings of the same torrent.
    pub fn parse(uri: &str) -> Result<Self, MagnetError> {
        let uri = uri.trim();
        let query = match uri.get(..MAGNET_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(MAGNET_PREFIX) => {
                &uri[MAGNET_PREFIX.len()..]
            }
            _ => return Err(MagnetError::NotMagnet),
        };

        let mut v1: Option<InfoHash> = None;
        let mut v2: Option<InfoHash> = None;
        // First valid hash of each version wins; the first parse error is
        // reported only when no usable hash turns up at all.
        let mut invalid: Option<MagnetError> = None;
        let mut display_name = None;
        let mut trackers: Vec<String> = Vec::new();
        let mut seen_trackers: HashSet<String> = HashSet::new();

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "dn" => display_name = Some(decode_component(value)),
                "tr" => {
                    let tracker = decode_component(value);
                    if !tracker.is_empty() && seen_trackers.insert(tracker.clone()) {
                        trackers.push(tracker);
                    }
                }
                k if k == "xt" || k.starts_with("xt.") => {
                    let value = decode_component(value);
                    let (slot, parsed) =
                        if let Some(hash) = strip_prefix_ignore_case(&value, BTIH_PREFIX) {
                            (&mut v1, InfoHash::from_btih(hash))
                        } else if let Some(hash) = strip_prefix_ignore_case(&value, BTMH_PREFIX) {
                            (&mut v2, InfoHash::from_btmh(hash))
                        } else {
                            continue;
                        };
                    if slot.is_none() {
                        match parsed {
                            Ok(hash) => *slot = Some(hash),
                            Err(e) => {
                                invalid.get_or_insert(e);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let info_hash = v1
            .or(v2)
            .ok_or_else(|| invalid.unwrap_or(MagnetError::MissingInfoHash))?;
        Ok(Self {
            info_hash,
            display_name: display_name.filter(|n| !n.is_empty()),
            trackers,
        })
    }

    /// Serialize to the canonical URI form.
    pub fn to_uri(&self) -> String {
        let mut uri = format!("{}xt={}", MAGNET_PREFIX, self.info_hash.urn());
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            uri.push_str("&dn=");
            uri.push_str(&urlencoding::encode(name));
        }
        for tracker in &self.trackers {
            uri.push_str("&tr=");
            uri.push_str(&urlencoding::encode(tracker));
        }
        uri
    }
}

/// Parse a magnet URI into its identity, name hint and trackers.
pub fn parse_magnet(uri: &str) -> Result<Magnet, MagnetError> {
    Magnet::parse(uri)
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    value
        .get(..prefix.len())
        .filter(|p| p.eq_ignore_ascii_case(prefix))
        .map(|_| &value[prefix.len()..])
}

/// Percent-decode a query component, treating `+` as a space.
fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(value.as_bytes()))
            .into_owned(),
    }
}

/// RFC 4648 base32 (no padding), case-insensitive.
fn decode_base32(input: &str, out: &mut [u8]) -> Result<(), MagnetError> {
    let invalid = || MagnetError::InvalidInfoHash(input.to_string());
    if input.len() * 5 != out.len() * 8 {
        return Err(invalid());
    }
    let mut buffer: u64 = 0;
    let mut bits = 0;
    let mut pos = 0;
    for c in input.bytes() {
        let v = match c.to_ascii_uppercase() {
            c @ b'A'..=b'Z' => c - b'A',
            c @ b'2'..=b'7' => c - b'2' + 26,
            _ => return Err(invalid()),
        };
        buffer = (buffer << 5) | u64::from(v);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out[pos] = (buffer >> bits) as u8;
            pos += 1;
        }
    }
    Ok(())
}
