//! Group Module
//!
//! A [`Group`] is a cache namespace: a name, a [`Loader`] for misses, its own
//! byte-budgeted cache and, optionally, a [`PeerPicker`] that routes keys
//! owned by other nodes.
//!
//! Read path:
//! 1. cache hit: return the cached view
//! 2. miss: one resolution per key is in flight at a time
//! 3. resolution asks the owning peer, falling back to the local loader
//!    (whose values are written into the cache)

mod registry;
mod stats;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStats, SharedCache};
use crate::error::{CacheError, Result};
use crate::flight::FlightGroup;
use crate::peers::{PeerFetcher, PeerPicker};

pub use registry::Registry;
pub use stats::{GroupStats, GroupStatsSnapshot};

// == Loader ==
/// Loads the value for a key on a cache miss.
///
/// The returned buffer is moved into the cache, so the loader cannot keep an
/// alias to cached bytes.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts an async closure into a [`Loader`].
///
/// ```ignore
/// let loader = LoaderFn(|key: String| async move { Ok(key.into_bytes()) });
/// ```
pub struct LoaderFn<F>(pub F);

#[async_trait]
impl<F, Fut> Loader for LoaderFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<u8>>> + Send + 'static,
{
    async fn load(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key.to_string()).await
    }
}

// == Group ==
/// Cheap to clone; clones share the same cache and in-flight calls.
#[derive(Clone)]
pub struct Group {
    inner: Arc<GroupInner>,
}

struct GroupInner {
    name: String,
    loader: Arc<dyn Loader>,
    main_cache: SharedCache,
    flight: FlightGroup<Result<ByteView>>,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    stats: GroupStats,
}

impl Group {
    /// Creates an unregistered group. Use [`Registry::create_group`] to make
    /// it reachable from the peer protocol.
    pub fn new(name: impl Into<String>, cache_bytes: usize, loader: impl Loader + 'static) -> Self {
        Self {
            inner: Arc::new(GroupInner {
                name: name.into(),
                loader: Arc::new(loader),
                main_cache: SharedCache::new(cache_bytes),
                flight: FlightGroup::new(),
                peers: OnceLock::new(),
                stats: GroupStats::new(),
            }),
        }
    }

    /// Group name, as registered.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Installs the peer picker. May be called at most once.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) -> Result<()> {
        self.inner.peers.set(peers).map_err(|_| {
            CacheError::Configuration(format!(
                "peers already registered for group {}",
                self.inner.name
            ))
        })
    }

    // == Get ==
    /// Returns the value for `key`, loading it on a miss.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        self.inner.stats.record_get();
        if key.is_empty() {
            return Err(CacheError::InvalidArgument("key is required".to_string()));
        }

        if let Some(value) = self.inner.main_cache.get(key) {
            self.inner.stats.record_cache_hit();
            debug!(group = %self.inner.name, key, "cache hit");
            return Ok(value);
        }

        self.load(key).await
    }

    async fn load(&self, key: &str) -> Result<ByteView> {
        self.inner.stats.record_load();
        let group = self.clone();
        let owned = key.to_string();
        self.inner
            .flight
            .execute(key, async move { group.resolve(&owned).await })
            .await?
    }

    async fn resolve(&self, key: &str) -> Result<ByteView> {
        self.inner.stats.record_load_deduped();

        if let Some(peer) = self.inner.peers.get().and_then(|p| p.pick_peer(key)) {
            match self.get_from_peer(peer.as_ref(), key).await {
                Ok(value) => {
                    self.inner.stats.record_peer_load();
                    return Ok(value);
                }
                Err(e) => {
                    self.inner.stats.record_peer_error();
                    warn!(
                        group = %self.inner.name,
                        key,
                        peer = peer.addr(),
                        error = %e,
                        "peer fetch failed, loading locally"
                    );
                }
            }
        }

        self.get_locally(key).await
    }

    async fn get_from_peer(&self, peer: &dyn PeerFetcher, key: &str) -> Result<ByteView> {
        let bytes = peer.fetch(&self.inner.name, key).await?;
        Ok(ByteView::copy_from_slice(&bytes))
    }

    async fn get_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.inner.loader.load(key).await.map_err(|e| {
            self.inner.stats.record_local_load_err();
            CacheError::Load(e.to_string())
        })?;
        self.inner.stats.record_local_load();

        let value = ByteView::from(bytes);
        self.populate_cache(key, value.clone());
        Ok(value)
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.inner.main_cache.add(key, value);
    }

    /// Snapshot of the read path counters.
    pub fn stats(&self) -> GroupStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Statistics of the local cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.main_cache.stats()
    }

    pub(crate) fn record_server_request(&self) {
        self.inner.stats.record_server_request();
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.inner.name)
            .field("cache_bytes", &self.inner.main_cache.max_bytes())
            .field("has_peers", &self.inner.peers.get().is_some())
            .finish()
    }
}
