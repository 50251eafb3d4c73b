//! Peer Capabilities
//!
//! A [`PeerPicker`] decides which remote peer owns a key; a [`PeerFetcher`]
//! asks that peer for a value. [`http::HttpPool`] implements both over HTTP.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use http::{HttpFetcher, HttpPool};

/// Locates the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Returns the owning peer, or None when this node owns the key or no
    /// peers are configured.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerFetcher>>;
}

/// Fetches a group-scoped value from one remote peer.
#[async_trait]
pub trait PeerFetcher: Send + Sync {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes>;

    /// Identifies the peer in logs.
    fn addr(&self) -> &str;
}
