//! Configuration Module
//!
//! Handles loading node configuration from environment variables.

use std::env;

use crate::error::{CacheError, Result};
use crate::peers::http::DEFAULT_BASE_PATH;
use crate::ring::DEFAULT_REPLICAS;

/// Node configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port of the peer protocol listener
    pub server_port: u16,
    /// This node's base URL as the other peers know it
    pub self_addr: String,
    /// Base URLs of every peer in the group, including this node
    pub peers: Vec<String>,
    /// Route prefix for peer traffic, always starting and ending with `/`
    pub base_path: String,
    /// Virtual replicas per node on the hash ring
    pub replicas: usize,
    /// Byte budget of the demo group (0 = unbounded)
    pub cache_bytes: usize,
    /// Peer request timeout in milliseconds (0 = none)
    pub peer_timeout_ms: u64,
    /// Whether to start the front-end API server
    pub api_enabled: bool,
    /// Port of the front-end API server
    pub api_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Peer listener port (default: 8001)
    /// - `SELF_ADDR` - Base URL of this node (default: `http://localhost:<SERVER_PORT>`)
    /// - `PEERS` - Comma separated peer base URLs (default: this node only)
    /// - `BASE_PATH` - Peer route prefix (default: `/_cache/`)
    /// - `REPLICAS` - Virtual replicas per node (default: 50)
    /// - `CACHE_BYTES` - Byte budget of the demo group (default: 2048)
    /// - `PEER_TIMEOUT_MS` - Peer request timeout (default: 3000)
    /// - `API_ENABLED` - Start the front-end API (default: false)
    /// - `API_PORT` - Front-end API port (default: 9999)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let server_port = parse_var("SERVER_PORT").unwrap_or(defaults.server_port);
        let self_addr =
            env::var("SELF_ADDR").unwrap_or_else(|_| format!("http://localhost:{server_port}"));
        let peers = env::var("PEERS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|peers| !peers.is_empty())
            .unwrap_or_else(|| vec![self_addr.clone()]);

        Self {
            server_port,
            self_addr,
            peers,
            base_path: normalize_base_path(
                &env::var("BASE_PATH").unwrap_or(defaults.base_path),
            ),
            replicas: parse_var("REPLICAS").unwrap_or(defaults.replicas),
            cache_bytes: parse_var("CACHE_BYTES").unwrap_or(defaults.cache_bytes),
            peer_timeout_ms: parse_var("PEER_TIMEOUT_MS").unwrap_or(defaults.peer_timeout_ms),
            api_enabled: parse_var("API_ENABLED").unwrap_or(defaults.api_enabled),
            api_port: parse_var("API_PORT").unwrap_or(defaults.api_port),
        }
    }

    /// Rejects settings that would make peers disagree or fail at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.replicas == 0 {
            return Err(CacheError::Configuration(
                "REPLICAS must be greater than 0".to_string(),
            ));
        }
        if !self.peers.iter().any(|p| p == &self.self_addr) {
            return Err(CacheError::Configuration(format!(
                "PEERS must include this node ({})",
                self.self_addr
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let self_addr = "http://localhost:8001".to_string();
        Self {
            server_port: 8001,
            peers: vec![self_addr.clone()],
            self_addr,
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas: DEFAULT_REPLICAS,
            cache_bytes: 2 << 10,
            peer_timeout_ms: 3000,
            api_enabled: false,
            api_port: 9999,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Ensures the prefix starts and ends with `/`.
fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
