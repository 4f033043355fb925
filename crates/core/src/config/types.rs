use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::search::SourceSpec;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            search: SearchConfig::default(),
            sources: Vec::new(),
        }
    }
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
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Search orchestration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Concurrently executing search units.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Concurrent detail crawls within one unit.
    #[serde(default = "default_crawl_concurrency")]
    pub crawl_concurrency: usize,
    /// Shutdown drain timeout in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            crawl_concurrency: default_crawl_concurrency(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

fn default_workers() -> usize {
    6
}

fn default_crawl_concurrency() -> usize {
    4
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Which extractor implementation a configured source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    TorrentsCsv,
}

/// One configured source: extractor kind plus its pagination/crawl policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceEntry {
    pub kind: SourceKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Override the extractor's default base URL (mirrors, tests).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(flatten)]
    pub spec: SourceSpec,
}

fn default_enabled() -> bool {
    true
}
