//! HTTP Peer Pool
//!
//! Routes keys over a consistent hash ring of peer base URLs and fetches
//! values from the owning peer with `GET <peer><base-path><group>/<key>`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::peers::{PeerFetcher, PeerPicker};
use crate::ring::{HashRing, DEFAULT_REPLICAS};

/// Default route prefix for peer traffic.
pub const DEFAULT_BASE_PATH: &str = "/_cache/";

// == HTTP Fetcher ==
/// Client for a single remote peer.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    peer: String,
    base_url: String,
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher for `peer`, requesting under `base_path`.
    pub fn new(peer: &str, base_path: &str, client: Client) -> Self {
        Self {
            peer: peer.to_string(),
            base_url: format!("{}{}", peer.trim_end_matches('/'), base_path),
            client,
        }
    }

    fn url(&self, group: &str, key: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            urlencoding::encode(group),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl PeerFetcher for HttpFetcher {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes> {
        let res = self
            .client
            .get(self.url(group, key))
            .send()
            .await
            .map_err(|e| CacheError::PeerUnavailable(format!("{}: {e}", self.peer)))?;

        if res.status() != StatusCode::OK {
            return Err(CacheError::PeerUnavailable(format!(
                "{} returned: {}",
                self.peer,
                res.status()
            )));
        }

        res.bytes().await.map_err(|e| {
            CacheError::PeerUnavailable(format!("reading response body from {}: {e}", self.peer))
        })
    }

    fn addr(&self) -> &str {
        &self.peer
    }
}

/// Ring and clients for one peer set; replaced as a whole by `set_peers`.
#[derive(Default)]
struct PeerSet {
    ring: HashRing,
    fetchers: HashMap<String, Arc<HttpFetcher>>,
}

// == HTTP Pool ==
/// Peer picker for a pool of HTTP peers, one of which is this node.
pub struct HttpPool {
    self_addr: String,
    base_path: String,
    replicas: usize,
    client: Client,
    peers: RwLock<Arc<PeerSet>>,
}

impl HttpPool {
    /// Creates a pool with the default base path, replica count and a client
    /// without a request timeout.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::with_options(
            self_addr,
            DEFAULT_BASE_PATH,
            DEFAULT_REPLICAS,
            Client::new(),
        )
    }

    /// Creates a pool with an explicit base path, replica count and client.
    pub fn with_options(
        self_addr: impl Into<String>,
        base_path: impl Into<String>,
        replicas: usize,
        client: Client,
    ) -> Self {
        Self {
            self_addr: self_addr.into(),
            base_path: base_path.into(),
            replicas,
            client,
            peers: RwLock::new(Arc::new(PeerSet::default())),
        }
    }

    /// Builds a pool from node configuration, including the peer timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if config.peer_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.peer_timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| CacheError::Configuration(format!("building peer client: {e}")))?;
        let pool = Self::with_options(
            config.self_addr.clone(),
            config.base_path.clone(),
            config.replicas,
            client,
        );
        pool.set_peers(&config.peers);
        Ok(pool)
    }

    /// Replaces the whole peer set. The new ring is built before the lock is
    /// taken, so routing never sees a partial ring.
    pub fn set_peers<S: AsRef<str>>(&self, peers: &[S]) {
        let mut ring = HashRing::new(self.replicas, None);
        ring.add(peers);
        let fetchers = peers
            .iter()
            .map(|peer| {
                let peer = peer.as_ref();
                let fetcher = HttpFetcher::new(peer, &self.base_path, self.client.clone());
                (peer.to_string(), Arc::new(fetcher))
            })
            .collect();
        let next = Arc::new(PeerSet { ring, fetchers });

        *self.peers.write() = next;
        info!(self_addr = %self.self_addr, peers = peers.len(), "peer set updated");
    }

    /// This node's own address, never picked as a peer.
    pub fn self_addr(&self) -> &str {
        &self.self_addr
    }

    /// Path prefix of the peer protocol.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Peers currently on the ring, sorted.
    pub fn peers(&self) -> Vec<String> {
        let snapshot = self.peers.read().clone();
        snapshot.ring.nodes().into_iter().map(str::to_string).collect()
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>> {
        let snapshot = self.peers.read().clone();
        let peer = snapshot.ring.route(key)?;
        if peer == self.self_addr {
            return None;
        }
        debug!(self_addr = %self.self_addr, peer, key, "picked remote peer");
        let fetcher: Arc<dyn PeerFetcher> = snapshot.fetchers.get(peer)?.clone();
        Some(fetcher)
    }
}
