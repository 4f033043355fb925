//! torrents-csv.com extractor.
//!
//! The search API returns complete torrent metadata in one response, so
//! this source never crawls. Responses have drifted between a bare JSON
//! array and `{"torrents": [...]}` across API versions; both shapes are
//! accepted, with field-name fallbacks for the same reason.

use chrono::DateTime;
use serde::Deserialize;
use tracing::debug;

use dragnet_core::{ExtractError, FetchRequest, SearchHit, SourceExtractor};

const DEFAULT_BASE_URL: &str = "https://torrents-csv.com";
const MAX_RESULTS: usize = 50;

/// Tracker parameters appended to generated magnet links, pre-encoded.
const MAGNET_TRACKERS: &str = "&tr=udp%3A%2F%2Ftracker.opentrackr.org%3A1337%2Fannounce\
&tr=udp%3A%2F%2Ftracker.openbittorrent.com%3A6969%2Fannounce\
&tr=udp%3A%2F%2Fexodus.desync.com%3A6969%2Fannounce";

pub struct TorrentsCsvSource {
    name: String,
    base_url: String,
}

impl TorrentsCsvSource {
    pub fn new(name: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn hit_from_row(&self, row: TorrentRow) -> Option<SearchHit> {
        let name = row.name.filter(|n| !n.is_empty())?;
        let Some(info_hash) = row.infohash.as_deref().and_then(normalize_info_hash) else {
            debug!(source = %self.name, torrent = %name, "Skipping row with invalid info hash");
            return None;
        };

        let magnet = row
            .magnet
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| build_magnet(&info_hash, &name));

        Some(SearchHit {
            title: name,
            source: self.name.clone(),
            details_url: None,
            size_bytes: row.size_bytes.unwrap_or(0),
            seeders: row.seeders.unwrap_or(0),
            leechers: row.leechers.unwrap_or(0),
            publish_date: row
                .created_unix
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            download_url: Some(magnet),
            info_hash: Some(info_hash),
            complete: true,
            crawl_handle: None,
        })
    }
}

impl SourceExtractor for TorrentsCsvSource {
    fn search_request(&self, encoded_keywords: &str, _page: u32) -> FetchRequest {
        // The service paginates with an opaque cursor, not page numbers;
        // one page of MAX_RESULTS per session.
        FetchRequest::get(format!(
            "{}/service/search?q={}&size={}",
            self.base_url, encoded_keywords, MAX_RESULTS
        ))
    }

    fn parse_search_page(&self, body: &[u8]) -> Result<Vec<SearchHit>, ExtractError> {
        let payload: Payload =
            serde_json::from_slice(body).map_err(|e| ExtractError::Malformed(e.to_string()))?;
        let rows = match payload {
            Payload::Wrapped(wrapped) => wrapped.torrents,
            Payload::Bare(rows) => rows,
        };
        Ok(rows
            .into_iter()
            .take(MAX_RESULTS)
            .filter_map(|row| self.hit_from_row(row))
            .collect())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped(Wrapped),
    Bare(Vec<TorrentRow>),
}

#[derive(Deserialize)]
struct Wrapped {
    #[serde(alias = "results", alias = "data")]
    torrents: Vec<TorrentRow>,
}

#[derive(Deserialize)]
struct TorrentRow {
    #[serde(default, alias = "title", alias = "filename")]
    name: Option<String>,
    #[serde(default, alias = "info_hash", alias = "hash")]
    infohash: Option<String>,
    #[serde(default, alias = "magnet_uri")]
    magnet: Option<String>,
    #[serde(default, alias = "size", alias = "length")]
    size_bytes: Option<u64>,
    #[serde(default, alias = "seeds")]
    seeders: Option<u32>,
    #[serde(default)]
    leechers: Option<u32>,
    #[serde(default, alias = "created")]
    created_unix: Option<i64>,
}

/// Accept 40-char hex (lowercased) or 32-char base32 (uppercased) info
/// hashes; salvage hex hashes wrapped in junk characters.
fn normalize_info_hash(raw: &str) -> Option<String> {
    let lower = raw.trim().to_lowercase();
    if lower.len() == 40 && lower.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(lower);
    }

    let upper = lower.to_uppercase();
    if upper.len() == 32
        && upper
            .bytes()
            .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b))
    {
        return Some(upper);
    }

    let cleaned: String = lower
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .collect();
    if cleaned.len() == 40 {
        return Some(cleaned);
    }

    None
}

fn build_magnet(info_hash: &str, name: &str) -> String {
    format!(
        "magnet:?xt=urn:btih:{}&dn={}{}",
        info_hash,
        urlencoding::encode(name),
        MAGNET_TRACKERS
    )
}
